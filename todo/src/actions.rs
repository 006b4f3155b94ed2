//! Todo actions: the wire contract, its typed form, and the action creator.
//!
//! On the wire an action is a kind string plus `key-text` / `key-id`
//! payload entries. Inside the store every action is decoded once into
//! [`TodoAction`], so no code past the decoder reads the payload map.

use crate::types::{Todo, TodoId};
use fluxtodo_core::{Action, ActionError, Value};
use fluxtodo_runtime::{DispatchError, Dispatcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Action kind strings understood by the todo store
pub mod kinds {
    /// Create a todo; payload `key-text`
    pub const CREATE: &str = "todo-create";
    /// Mark a todo complete; payload `key-id`
    pub const COMPLETE: &str = "todo-complete";
    /// Destroy a todo into the undo buffer; payload `key-id`
    pub const DESTROY: &str = "todo-destroy";
    /// Remove every complete todo
    pub const DESTROY_COMPLETED: &str = "todo-destroy-completed";
    /// Complete all, or un-complete all when every todo is already complete
    pub const TOGGLE_COMPLETE_ALL: &str = "todo-toggle-complete-all";
    /// Mark a todo incomplete; payload `key-id`
    pub const UNDO_COMPLETE: &str = "todo-undo-complete";
    /// Restore the last destroyed todo
    pub const UNDO_DESTROY: &str = "todo-undo-destroy";
}

/// Payload keys
pub mod keys {
    /// Text of a new todo
    pub const TEXT: &str = "key-text";
    /// Id of an existing todo
    pub const ID: &str = "key-id";
}

/// Typed form of every action the todo store handles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    /// Create a new incomplete todo
    Create {
        /// Description of the todo
        text: String,
    },
    /// Move a todo into the undo buffer
    Destroy {
        /// Todo to destroy
        id: TodoId,
    },
    /// Restore the buffered todo
    UndoDestroy,
    /// Mark a todo complete
    Complete {
        /// Todo to complete
        id: TodoId,
    },
    /// Mark a todo incomplete
    UndoComplete {
        /// Todo to reopen
        id: TodoId,
    },
    /// Remove every complete todo
    DestroyCompleted,
    /// Complete all, or reopen all if all are complete
    ToggleCompleteAll,
}

impl TodoAction {
    /// The wire kind string for this action
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => kinds::CREATE,
            Self::Destroy { .. } => kinds::DESTROY,
            Self::UndoDestroy => kinds::UNDO_DESTROY,
            Self::Complete { .. } => kinds::COMPLETE,
            Self::UndoComplete { .. } => kinds::UNDO_COMPLETE,
            Self::DestroyCompleted => kinds::DESTROY_COMPLETED,
            Self::ToggleCompleteAll => kinds::TOGGLE_COMPLETE_ALL,
        }
    }

    /// Decode a dispatched action
    ///
    /// Returns `Ok(None)` for kinds the todo store does not own.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::MissingKey`] or [`ActionError::WrongType`] when
    /// a recognized kind lacks its required payload entry.
    pub fn from_action(action: &Action) -> Result<Option<Self>, ActionError> {
        let id = || action.require_i64(keys::ID).map(TodoId::new);

        let decoded = match action.kind() {
            kinds::CREATE => Self::Create {
                text: action.require_str(keys::TEXT)?.to_string(),
            },
            kinds::DESTROY => Self::Destroy { id: id()? },
            kinds::UNDO_DESTROY => Self::UndoDestroy,
            kinds::COMPLETE => Self::Complete { id: id()? },
            kinds::UNDO_COMPLETE => Self::UndoComplete { id: id()? },
            kinds::DESTROY_COMPLETED => Self::DestroyCompleted,
            kinds::TOGGLE_COMPLETE_ALL => Self::ToggleCompleteAll,
            _ => return Ok(None),
        };

        Ok(Some(decoded))
    }

    /// The payload entry this action carries, if any
    #[must_use]
    pub fn payload(&self) -> Option<(&'static str, Value)> {
        match self {
            Self::Create { text } => Some((keys::TEXT, text.as_str().into())),
            Self::Destroy { id } | Self::Complete { id } | Self::UndoComplete { id } => {
                Some((keys::ID, id.as_i64().into()))
            }
            Self::UndoDestroy | Self::DestroyCompleted | Self::ToggleCompleteAll => None,
        }
    }

    /// Flattened `key, value` payload entries for [`Dispatcher::dispatch`]
    #[must_use]
    pub fn entries(&self) -> Vec<Value> {
        self.payload()
            .map(|(key, value)| vec![key.into(), value])
            .unwrap_or_default()
    }

    /// Encode into the wire form
    ///
    /// # Errors
    ///
    /// Never fails for well-formed variants; the builder's validation is
    /// still applied.
    pub fn to_action(&self) -> Result<Action, ActionError> {
        let builder = Action::with_kind(self.kind());
        match self.payload() {
            Some((key, value)) => builder.bundle(key, value)?.build(),
            None => builder.build(),
        }
    }
}

impl TryFrom<&Action> for TodoAction {
    type Error = ActionError;

    /// Like [`TodoAction::from_action`], but an unknown kind is an error
    fn try_from(action: &Action) -> Result<Self, Self::Error> {
        Self::from_action(action)?.ok_or_else(|| {
            ActionError::InvalidArgument(format!("Unknown todo action kind '{}'", action.kind()))
        })
    }
}

/// Turns user intents into dispatcher calls.
///
/// Holds a shared handle to the application's one [`Dispatcher`].
#[derive(Clone, Debug)]
pub struct ActionsCreator {
    dispatcher: Arc<Dispatcher>,
}

impl ActionsCreator {
    /// Creates an action creator sending through `dispatcher`
    #[must_use]
    pub const fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Create a todo with `text`
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn create(&self, text: &str) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(kinds::CREATE, &[keys::TEXT.into(), text.into()])
    }

    /// Destroy the todo with `id`, buffering it for undo
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn destroy(&self, id: TodoId) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(kinds::DESTROY, &[keys::ID.into(), id.as_i64().into()])
    }

    /// Restore the most recently destroyed todo
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn undo_destroy(&self) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(kinds::UNDO_DESTROY, &[])
    }

    /// Flip one todo: complete it if open, reopen it if complete
    ///
    /// The decision is made from `todo` as the caller last saw it.
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn toggle_complete(&self, todo: &Todo) -> Result<(), DispatchError> {
        let kind = if todo.is_complete() {
            kinds::UNDO_COMPLETE
        } else {
            kinds::COMPLETE
        };
        self.dispatcher
            .dispatch(kind, &[keys::ID.into(), todo.id().as_i64().into()])
    }

    /// Complete every todo, or reopen every todo if all are complete
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn toggle_complete_all(&self) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(kinds::TOGGLE_COMPLETE_ALL, &[])
    }

    /// Remove every complete todo
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn destroy_completed(&self) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(kinds::DESTROY_COMPLETED, &[])
    }

    /// Send a typed action
    ///
    /// # Errors
    ///
    /// Propagates [`DispatchError`] from the dispatcher.
    pub fn send(&self, action: &TodoAction) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(action.kind(), &action.entries())
    }
}
