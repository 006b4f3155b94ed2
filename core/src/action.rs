//! Action values and their builder.
//!
//! An [`Action`] is an immutable message made of a kind tag and a payload of
//! key/value entries. Actions are only ever produced by [`ActionBuilder`],
//! which rejects every shape the rest of the system cannot interpret:
//!
//! - no kind, or an empty kind
//! - an empty key
//! - a `null` value
//!
//! Payload values are [`serde_json::Value`]s, so the builder accepts anything
//! that converts into JSON (`&str`, `String`, `i64`, `bool`, `Option<T>`, ...).
//!
//! # Example
//!
//! ```
//! use fluxtodo_core::action::Action;
//!
//! # fn main() -> Result<(), fluxtodo_core::action::ActionError> {
//! let action = Action::with_kind("todo-create")
//!     .bundle("key-text", "buy milk")?
//!     .build()?;
//!
//! assert_eq!(action.kind(), "todo-create");
//! assert_eq!(action.get_str("key-text"), Some("buy milk"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use serde_json::Value;

/// Errors raised while building or reading an [`Action`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The builder was given an argument it cannot accept
    ///
    /// Raised for a missing or empty kind, an empty key, or a `null` value.
    /// Nothing is constructed when this is returned.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload entry the reader requires is absent
    #[error("Action '{kind}' is missing payload key '{key}'")]
    MissingKey {
        /// Kind of the offending action
        kind: String,
        /// The key that was looked up
        key: String,
    },

    /// A payload entry exists but holds the wrong type
    #[error("Action '{kind}' payload key '{key}' is not {expected}")]
    WrongType {
        /// Kind of the offending action
        kind: String,
        /// The key that was looked up
        key: String,
        /// Human readable name of the expected type
        expected: &'static str,
    },
}

impl ActionError {
    fn invalid(reason: &str) -> Self {
        Self::InvalidArgument(reason.to_string())
    }
}

/// An immutable, validated message describing an intended state change.
///
/// Deserialization runs the same checks as [`ActionBuilder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAction")]
pub struct Action {
    kind: String,
    payload: BTreeMap<String, Value>,
}

/// Unvalidated serialized form of an [`Action`]
#[derive(Deserialize)]
struct WireAction {
    kind: Option<String>,
    #[serde(default)]
    payload: BTreeMap<String, Value>,
}

impl TryFrom<WireAction> for Action {
    type Error = ActionError;

    fn try_from(wire: WireAction) -> Result<Self, Self::Error> {
        let mut builder = ActionBuilder {
            kind: wire.kind,
            payload: BTreeMap::new(),
        };
        for (key, value) in wire.payload {
            builder = builder.bundle(key, value)?;
        }
        builder.build()
    }
}

impl Action {
    /// Starts a builder with the given kind
    #[must_use]
    pub fn with_kind(kind: impl Into<String>) -> ActionBuilder {
        ActionBuilder::default().kind(kind)
    }

    /// Starts a builder with no kind set
    #[must_use]
    pub fn builder() -> ActionBuilder {
        ActionBuilder::default()
    }

    /// The kind tag of this action
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The full payload, ordered by key
    #[must_use]
    pub const fn payload(&self) -> &BTreeMap<String, Value> {
        &self.payload
    }

    /// Looks up a raw payload value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Looks up a string payload value
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Looks up an integer payload value
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }

    /// Reads a string payload value that must be present
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::MissingKey`] if `key` is absent, or
    /// [`ActionError::WrongType`] if it does not hold a string.
    pub fn require_str(&self, key: &str) -> Result<&str, ActionError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| self.wrong_type(key, "a string"))
    }

    /// Reads an integer payload value that must be present
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::MissingKey`] if `key` is absent, or
    /// [`ActionError::WrongType`] if it does not hold an integer.
    pub fn require_i64(&self, key: &str) -> Result<i64, ActionError> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| self.wrong_type(key, "an integer"))
    }

    fn require(&self, key: &str) -> Result<&Value, ActionError> {
        self.payload.get(key).ok_or_else(|| ActionError::MissingKey {
            kind: self.kind.clone(),
            key: key.to_string(),
        })
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> ActionError {
        ActionError::WrongType {
            kind: self.kind.clone(),
            key: key.to_string(),
            expected,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.kind)?;
        for (i, (key, value)) in self.payload.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, "}}")
    }
}

/// Builder for [`Action`].
///
/// `bundle` and `build` validate eagerly and return [`ActionError`] so that a
/// chain can be written with `?`.
#[derive(Clone, Debug, Default)]
pub struct ActionBuilder {
    kind: Option<String>,
    payload: BTreeMap<String, Value>,
}

impl ActionBuilder {
    /// Sets (or replaces) the kind tag
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Adds one payload entry
    ///
    /// A repeated key replaces the earlier value.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidArgument`] if `key` is empty or `value`
    /// is `null`.
    pub fn bundle(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ActionError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ActionError::invalid("Key may not be null."));
        }

        let value = value.into();
        if value.is_null() {
            return Err(ActionError::invalid("Value may not be null."));
        }

        self.payload.insert(key, value);
        Ok(self)
    }

    /// Produces the immutable action
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidArgument`] if no kind was set or the kind
    /// is empty.
    pub fn build(self) -> Result<Action, ActionError> {
        match self.kind {
            None => Err(ActionError::invalid("Type may not be null.")),
            Some(kind) if kind.is_empty() => Err(ActionError::invalid("Type may not be empty.")),
            Some(kind) => Ok(Action {
                kind,
                payload: self.payload,
            }),
        }
    }
}
