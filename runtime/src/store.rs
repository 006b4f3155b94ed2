//! The store base contract.
//!
//! A store owns a slice of application state and is the only component
//! allowed to mutate it. It registers with the [`Dispatcher`] as an
//! [`ActionHandler`], applies the actions it recognizes, then emits a
//! store-specific change event through its [`ChangeEmitter`].
//!
//! Change events are delivered two ways:
//!
//! - **Listeners** registered with [`ChangeEmitter::subscribe`] run inline,
//!   before `dispatch` returns.
//! - **Streams** from [`ChangeEmitter::subscribe_stream`] receive a clone of
//!   every event over a `tokio` broadcast channel. The event is enqueued
//!   before `dispatch` returns; async consumers read it whenever they poll.

use crate::dispatcher::{ActionHandler, Dispatcher, HandlerId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Configuration for store instances
///
/// # Example
///
/// ```
/// use fluxtodo_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_change_capacity(64);
/// assert_eq!(config.change_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of change events buffered for each stream subscriber
    ///
    /// A stream that falls further behind than this skips the oldest events.
    pub change_capacity: usize,
}

impl StoreConfig {
    /// Create a configuration with custom values
    #[must_use]
    pub const fn new(change_capacity: usize) -> Self {
        Self { change_capacity }
    }

    /// Set the change stream capacity
    #[must_use]
    pub const fn with_change_capacity(mut self, capacity: usize) -> Self {
        self.change_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            change_capacity: 16,
        }
    }
}

/// Identifies a listener registered on a [`ChangeEmitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Delivers a store's change events to its observers.
pub struct ChangeEmitter<E> {
    listeners: Mutex<Vec<(ListenerId, Listener<E>)>>,
    next_id: AtomicU64,
    stream: broadcast::Sender<E>,
    emitted: AtomicU64,
}

impl<E> ChangeEmitter<E>
where
    E: Clone + Send + 'static,
{
    /// Create an emitter whose streams buffer `capacity` events
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (stream, _) = broadcast::channel(capacity.max(1));
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            stream,
            emitted: AtomicU64::new(0),
        }
    }

    /// Create an emitter from a [`StoreConfig`]
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.change_capacity)
    }

    /// Register a listener that runs synchronously on every emission
    ///
    /// Listeners run in registration order. A listener may read the store
    /// but must not dispatch.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener
    ///
    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Receive every future event over a broadcast channel
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut changes = store.emitter().subscribe_stream();
    /// while let Ok(change) = changes.recv().await {
    ///     render(&store.todos());
    /// }
    /// ```
    #[must_use]
    pub fn subscribe_stream(&self) -> broadcast::Receiver<E> {
        self.stream.subscribe()
    }

    /// Number of synchronous listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total number of events emitted so far
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Acquire)
    }

    /// Deliver an event to every listener and stream
    ///
    /// Returns how many observers received it.
    pub fn emit(&self, event: &E) -> usize {
        let listeners: Vec<Listener<E>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(event);
        }

        self.emitted.fetch_add(1, Ordering::AcqRel);
        metrics::counter!("store.changes.total").increment(1);

        // No stream subscribers is not an error.
        let streamed = self.stream.send(event.clone()).unwrap_or(0);

        tracing::trace!(listeners = listeners.len(), streamed, "Emitted store change");
        listeners.len() + streamed
    }
}

impl<E> fmt::Debug for ChangeEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEmitter")
            .field(
                "listeners",
                &self
                    .listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
            )
            .field("streams", &self.stream.receiver_count())
            .field("emitted", &self.emitted.load(Ordering::Acquire))
            .finish()
    }
}

/// Base contract for every store.
///
/// Concrete stores implement [`ActionHandler::on_action`] to apply the kinds
/// they own, and call [`Store::emit_store_change`] once per recognized action.
pub trait Store: ActionHandler {
    /// The value observers receive when this store changes
    type ChangeEvent: Clone + Send + 'static;

    /// Produce the next change event
    fn change_event(&self) -> Self::ChangeEvent;

    /// The emitter observers subscribe to
    fn emitter(&self) -> &ChangeEmitter<Self::ChangeEvent>;

    /// Build a change event and deliver it to all observers
    fn emit_store_change(&self) -> Self::ChangeEvent {
        let event = self.change_event();
        self.emitter().emit(&event);
        event
    }

    /// Register `store` with `dispatcher` so it receives every action
    fn register(store: &Arc<Self>, dispatcher: &Dispatcher) -> HandlerId
    where
        Self: Sized + 'static,
    {
        let handler: Arc<dyn ActionHandler> = Arc::clone(store) as Arc<dyn ActionHandler>;
        dispatcher.subscribe(handler)
    }
}
