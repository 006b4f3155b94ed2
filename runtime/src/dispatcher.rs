//! The dispatcher: one synchronous broadcast channel for every action.
//!
//! There is no topic routing at this layer. Every subscribed handler sees
//! every action and decides for itself which kinds it cares about.

use crate::error::{DispatchError, StoreError};
use fluxtodo_core::{Action, ActionError, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Receives every action sent through a [`Dispatcher`].
///
/// Implementations filter by [`Action::kind`] and ignore kinds they do not
/// own. Returning an error aborts the dispatch in progress.
pub trait ActionHandler: Send + Sync {
    /// Handle one dispatched action
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the action is recognized but unusable.
    fn on_action(&self, action: &Action) -> Result<(), StoreError>;
}

/// Identifies a subscription on a [`Dispatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

type Subscriptions = Vec<(HandlerId, Arc<dyn ActionHandler>)>;

/// Synchronous action dispatcher.
///
/// Construct exactly one per application and share it by reference (or
/// `Arc`) with every store and action creator.
///
/// # Example
///
/// ```
/// use fluxtodo_runtime::Dispatcher;
///
/// let dispatcher = Dispatcher::new();
/// // No subscribers yet: the action is built and delivered to nobody.
/// dispatcher
///     .dispatch("todo-create", &["key-text".into(), "buy milk".into()])
///     .unwrap();
/// ```
pub struct Dispatcher {
    handlers: RwLock<Subscriptions>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher with no subscribers
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler for every future action
    ///
    /// Handlers are invoked in the order they subscribed.
    pub fn subscribe(&self, handler: Arc<dyn ActionHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        tracing::debug!(handler = %id, "Handler subscribed");
        id
    }

    /// Remove a handler
    ///
    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() != before;
        if removed {
            tracing::debug!(handler = %id, "Handler unsubscribed");
        }
        removed
    }

    /// Number of subscribed handlers
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Build an action from a kind and flattened `key, value` entries and
    /// deliver it to every handler
    ///
    /// Keys must be JSON strings. Values follow the [`Action`] builder rules.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::OddPayload`] if `entries` has an odd length
    /// - [`DispatchError::Action`] if a key is not a string or the action
    ///   fails validation
    /// - [`DispatchError::Handler`] if a handler rejects the action
    ///
    /// Construction errors are raised before any handler runs.
    #[tracing::instrument(skip(self, entries), fields(entries = entries.len()), name = "dispatch")]
    pub fn dispatch(&self, kind: &str, entries: &[Value]) -> Result<(), DispatchError> {
        let action = Self::assemble(kind, entries)?;
        self.send(action)
    }

    /// Deliver an already built action to every handler
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Handler`] for the first handler that rejects
    /// the action. Later handlers are skipped.
    pub fn send(&self, action: Action) -> Result<(), DispatchError> {
        // Snapshot so subscription changes made by handlers apply to the next
        // dispatch only.
        let handlers: Subscriptions = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        metrics::counter!("dispatcher.actions.total").increment(1);
        tracing::debug!(%action, handlers = handlers.len(), "Dispatching action");

        for (id, handler) in handlers {
            if let Err(source) = handler.on_action(&action) {
                metrics::counter!("dispatcher.handler.failures").increment(1);
                tracing::warn!(
                    handler = %id,
                    kind = action.kind(),
                    error = %source,
                    "Handler rejected action"
                );
                return Err(DispatchError::Handler {
                    handler: id,
                    kind: action.kind().to_string(),
                    source,
                });
            }
        }

        Ok(())
    }

    fn assemble(kind: &str, entries: &[Value]) -> Result<Action, DispatchError> {
        if entries.len() % 2 != 0 {
            return Err(DispatchError::OddPayload(entries.len()));
        }

        let mut builder = Action::with_kind(kind);
        for pair in entries.chunks_exact(2) {
            let Value::String(key) = &pair[0] else {
                return Err(ActionError::InvalidArgument(format!(
                    "Key must be a string, got {}",
                    pair[0]
                ))
                .into());
            };
            builder = builder.bundle(key.as_str(), pair[1].clone())?;
        }

        Ok(builder.build()?)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handler_count())
            .finish_non_exhaustive()
    }
}
