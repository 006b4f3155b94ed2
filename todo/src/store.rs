//! The todo store: the single owner of the todo collection.
//!
//! `TodoStore` is the imperative shell around [`TodoReducer`]. It decodes each
//! dispatched [`Action`] into a [`TodoAction`], applies it under one write lock
//! that guards the collection and undo buffer together, releases the lock,
//! then emits a [`TodoStoreChange`].
//!
//! Every recognized kind emits, including lookups that miss (destroying an
//! unknown id, undoing with an empty buffer). Unknown kinds are ignored and do
//! not emit.

use crate::actions::TodoAction;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{Todo, TodoId, TodoState};
use fluxtodo_core::{Action, reducer::Reducer};
use fluxtodo_runtime::{
    ActionHandler, ChangeEmitter, Dispatcher, Store, StoreConfig, StoreError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Change event emitted by [`TodoStore`]
///
/// Carries nothing beyond "state changed". `revision` counts emissions so
/// observers can tell events apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TodoStoreChange {
    /// Sequence number of this change, starting at 1
    pub revision: u64,
}

/// Store owning the ordered todo collection and the undo buffer
pub struct TodoStore {
    state: RwLock<TodoState>,
    reducer: TodoReducer,
    environment: TodoEnvironment,
    emitter: ChangeEmitter<TodoStoreChange>,
    revision: AtomicU64,
}

impl TodoStore {
    /// Create an empty store that is not yet subscribed to a dispatcher
    #[must_use]
    pub fn new(environment: TodoEnvironment, config: &StoreConfig) -> Self {
        Self::with_state(TodoState::new(), environment, config)
    }

    /// Create a store starting from `state`
    #[must_use]
    pub fn with_state(state: TodoState, environment: TodoEnvironment, config: &StoreConfig) -> Self {
        Self {
            state: RwLock::new(state),
            reducer: TodoReducer::new(),
            environment,
            emitter: ChangeEmitter::from_config(config),
            revision: AtomicU64::new(0),
        }
    }

    /// Create an empty store and subscribe it to `dispatcher`
    #[must_use]
    pub fn registered(
        dispatcher: &Dispatcher,
        environment: TodoEnvironment,
        config: &StoreConfig,
    ) -> Arc<Self> {
        let store = Arc::new(Self::new(environment, config));
        let handler = Store::register(&store, dispatcher);
        tracing::debug!(%handler, "TodoStore registered");
        store
    }

    /// Snapshot of the collection, sorted ascending by id
    #[must_use]
    pub fn todos(&self) -> Vec<Todo> {
        self.with_todos(<[Todo]>::to_vec)
    }

    /// Read the live collection without copying it
    ///
    /// The store is locked for reading while `f` runs; `f` must not dispatch.
    pub fn with_todos<T>(&self, f: impl FnOnce(&[Todo]) -> T) -> T {
        self.state(|state| f(state.todos()))
    }

    /// Read the whole state through a closure
    ///
    /// The store is locked for reading while `f` runs; `f` must not dispatch.
    pub fn state<T>(&self, f: impl FnOnce(&TodoState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&*state)
    }

    /// Whether an undo-destroy would restore something
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.state(TodoState::can_undo)
    }

    /// Number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.state(TodoState::count)
    }

    /// Number of complete todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.state(TodoState::completed_count)
    }

    /// True when every todo is complete (vacuously true when empty)
    #[must_use]
    pub fn are_all_complete(&self) -> bool {
        self.state(TodoState::are_all_complete)
    }

    /// Copy of the todo with `id`, if present
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.state(|state| state.get(id).cloned())
    }

    fn apply(&self, action: TodoAction) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.reducer.reduce(&mut *state, action, &self.environment);

        // Precision loss is irrelevant for a gauge of list length
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("todo_store.todos").set(state.count() as f64);
    }
}

impl ActionHandler for TodoStore {
    fn on_action(&self, action: &Action) -> Result<(), StoreError> {
        let Some(todo_action) = TodoAction::from_action(action)? else {
            tracing::trace!(kind = action.kind(), "Ignoring action");
            return Ok(());
        };

        tracing::debug!(action = ?todo_action, "Applying action");
        self.apply(todo_action);

        // Emitted after the write lock is released so listeners can read.
        let change = self.emit_store_change();
        tracing::trace!(revision = change.revision, "TodoStore changed");
        Ok(())
    }
}

impl Store for TodoStore {
    type ChangeEvent = TodoStoreChange;

    fn change_event(&self) -> TodoStoreChange {
        TodoStoreChange {
            revision: self.revision.fetch_add(1, Ordering::AcqRel) + 1,
        }
    }

    fn emitter(&self) -> &ChangeEmitter<TodoStoreChange> {
        &self.emitter
    }
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore")
            .field("todos", &self.count())
            .field("can_undo", &self.can_undo())
            .field("revision", &self.revision.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{keys, kinds};
    use fluxtodo_core::ActionError;
    use fluxtodo_runtime::DispatchError;
    use fluxtodo_testing::{ChangeRecorder, test_clock};
    use serde_json::json;

    fn store() -> (Dispatcher, Arc<TodoStore>) {
        let dispatcher = Dispatcher::new();
        let env = TodoEnvironment::new(Arc::new(test_clock()));
        let store = TodoStore::registered(&dispatcher, env, &StoreConfig::default());
        (dispatcher, store)
    }

    #[test]
    fn recognized_kinds_emit_even_when_nothing_changes() {
        let (dispatcher, store) = store();
        let changes = ChangeRecorder::attach(store.emitter());

        dispatcher
            .dispatch(kinds::DESTROY, &[json!(keys::ID), json!(12345)])
            .unwrap();
        dispatcher.dispatch(kinds::UNDO_DESTROY, &[]).unwrap();
        dispatcher
            .dispatch(kinds::COMPLETE, &[json!(keys::ID), json!(1)])
            .unwrap();
        dispatcher.dispatch(kinds::DESTROY_COMPLETED, &[]).unwrap();

        assert_eq!(changes.count(), 4);
        assert_eq!(store.count(), 0);
        assert!(!store.can_undo());
    }

    #[test]
    fn unknown_kinds_are_ignored_without_emission() {
        let (dispatcher, store) = store();
        let changes = ChangeRecorder::attach(store.emitter());

        dispatcher.dispatch("session-expired", &[]).unwrap();

        assert_eq!(changes.count(), 0);
    }

    #[test]
    fn revisions_increase_per_emission() {
        let (dispatcher, store) = store();
        let changes = ChangeRecorder::attach(store.emitter());

        dispatcher
            .dispatch(kinds::CREATE, &[json!(keys::TEXT), json!("a")])
            .unwrap();
        dispatcher.dispatch(kinds::TOGGLE_COMPLETE_ALL, &[]).unwrap();

        assert_eq!(
            changes.events(),
            vec![
                TodoStoreChange { revision: 1 },
                TodoStoreChange { revision: 2 }
            ]
        );
    }

    #[test]
    fn malformed_payload_fails_without_mutation_or_emission() {
        let (dispatcher, store) = store();
        let changes = ChangeRecorder::attach(store.emitter());

        let result = dispatcher.dispatch(kinds::CREATE, &[]);
        assert!(matches!(
            result,
            Err(DispatchError::Handler {
                source: StoreError::MalformedPayload(ActionError::MissingKey { .. }),
                ..
            })
        ));

        let result = dispatcher.dispatch(kinds::DESTROY, &[json!(keys::ID), json!("7")]);
        assert!(matches!(
            result,
            Err(DispatchError::Handler {
                source: StoreError::MalformedPayload(ActionError::WrongType { .. }),
                ..
            })
        ));

        assert_eq!(changes.count(), 0);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn listener_can_read_store_during_emission() {
        let (dispatcher, store) = store();
        let seen = Arc::new(RwLock::new(Vec::new()));
        {
            let reader = Arc::clone(&store);
            let seen = Arc::clone(&seen);
            store.emitter().subscribe(move |_| {
                seen.write().unwrap().push(reader.count());
            });
        }

        dispatcher
            .dispatch(kinds::CREATE, &[json!(keys::TEXT), json!("a")])
            .unwrap();
        dispatcher
            .dispatch(kinds::CREATE, &[json!(keys::TEXT), json!("b")])
            .unwrap();

        assert_eq!(*seen.read().unwrap(), vec![1, 2]);
    }

    #[test]
    fn deserialized_state_is_searchable() {
        let state: TodoState = serde_json::from_str(
            r#"{"todos": [
                {"id": 3, "text": "c", "complete": false},
                {"id": 1, "text": "a", "complete": false},
                {"id": 1, "text": "dup", "complete": true}
            ]}"#,
        )
        .unwrap();
        let dispatcher = Dispatcher::new();
        let store = Arc::new(TodoStore::with_state(
            state,
            TodoEnvironment::new(Arc::new(test_clock())),
            &StoreConfig::default(),
        ));
        Store::register(&store, &dispatcher);

        dispatcher
            .dispatch(kinds::COMPLETE, &[json!(keys::ID), json!(1)])
            .unwrap();
        dispatcher
            .dispatch(kinds::DESTROY, &[json!(keys::ID), json!(3)])
            .unwrap();

        let todos = store.todos();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].text(), "a");
        assert!(todos[0].is_complete());
        assert_eq!(store.state(|s| s.last_deleted().map(Todo::id)), Some(TodoId::new(3)));
    }

    #[test]
    fn with_state_seeds_collection() {
        let env = TodoEnvironment::new(Arc::new(test_clock()));
        let state = TodoState::with_todos([
            Todo::new(TodoId::new(2), "b"),
            Todo::with_complete(TodoId::new(1), "a", true),
        ]);
        let store = TodoStore::with_state(state, env, &StoreConfig::default());

        assert_eq!(store.count(), 2);
        assert_eq!(store.completed_count(), 1);
        assert!(!store.are_all_complete());
        assert_eq!(store.get(TodoId::new(1)).unwrap().text(), "a");
        assert_eq!(store.with_todos(|todos| todos[0].id()), TodoId::new(1));
    }
}
