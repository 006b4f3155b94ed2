//! Application context.
//!
//! One [`App`] per running application: it owns the dispatcher, the todo
//! store subscribed to it, and the action creator that feeds it. Build it at
//! the entry point and pass it (or its parts) by reference.

use crate::actions::ActionsCreator;
use crate::reducer::TodoEnvironment;
use crate::store::TodoStore;
use fluxtodo_runtime::{Dispatcher, StoreConfig};
use std::sync::Arc;

/// The wired-up dispatcher, store and action creator
#[derive(Clone, Debug)]
pub struct App {
    /// The application's only dispatcher
    pub dispatcher: Arc<Dispatcher>,
    /// The todo store, already subscribed to `dispatcher`
    pub todo_store: Arc<TodoStore>,
    /// Action creator sending through `dispatcher`
    pub actions: ActionsCreator,
}

impl App {
    /// Build the application context
    #[must_use]
    pub fn new(environment: TodoEnvironment, config: &StoreConfig) -> Self {
        let dispatcher = Arc::new(Dispatcher::new());
        let todo_store = TodoStore::registered(&dispatcher, environment, config);
        let actions = ActionsCreator::new(Arc::clone(&dispatcher));

        tracing::info!("Application context ready");

        Self {
            dispatcher,
            todo_store,
            actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxtodo_testing::test_clock;

    #[test]
    fn app_wires_store_to_dispatcher() {
        let app = App::new(
            TodoEnvironment::new(Arc::new(test_clock())),
            &StoreConfig::default(),
        );
        assert_eq!(app.dispatcher.handler_count(), 1);

        app.actions.create("buy milk").unwrap();

        assert_eq!(app.todo_store.count(), 1);
    }
}
