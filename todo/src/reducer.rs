//! Reducer logic for the todo store.
//!
//! Every state transition lives here as a pure function of
//! `(TodoState, TodoAction, TodoEnvironment)`. The store only adds locking
//! and change notification around it.

use crate::actions::TodoAction;
use crate::types::{Todo, TodoId, TodoState};
use fluxtodo_core::{environment::Clock, reducer::Reducer};
use std::sync::Arc;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for allocating ids
    pub clock: Arc<dyn Clock>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for the todo store
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn update_complete(state: &mut TodoState, id: TodoId, complete: bool) {
        match state.get_mut(id) {
            Some(todo) => todo.set_complete(complete),
            None => tracing::debug!(%id, "No todo to update"),
        }
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) {
        match action {
            TodoAction::Create { text } => match state.allocate_id(env.clock.now_millis()) {
                Some(id) => state.insert(Todo::new(id, text)),
                None => tracing::warn!("Todo ids exhausted; create dropped"),
            },

            TodoAction::Destroy { id } => match state.remove(id) {
                // Overwrites anything already buffered.
                Some(removed) => state.buffer_deleted(removed),
                None => tracing::debug!(%id, "No todo to destroy"),
            },

            TodoAction::UndoDestroy => {
                if let Some(restored) = state.take_deleted() {
                    state.insert(restored);
                }
            }

            TodoAction::Complete { id } => Self::update_complete(state, id, true),

            TodoAction::UndoComplete { id } => Self::update_complete(state, id, false),

            TodoAction::DestroyCompleted => {
                let removed = state.remove_completed();
                tracing::debug!(removed, "Destroyed completed todos");
            }

            TodoAction::ToggleCompleteAll => {
                let complete = !state.are_all_complete();
                state.set_all_complete(complete);
            }
        }
    }
}
