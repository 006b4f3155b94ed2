//! Todo list store driven by the Flux Todo dispatcher.
//!
//! This crate holds the todo domain: the ordered collection with its one-slot
//! undo buffer, the seven todo actions, the reducer that applies them, and the
//! store that owns the state.
//!
//! - Todos are always sorted ascending by id; ids are unique and strictly
//!   increasing even when two todos are created in the same millisecond
//! - Destroying a todo keeps one copy for undo; a second destroy replaces it
//! - Every recognized action emits a change, even when it changed nothing
//!
//! # Quick Start
//!
//! ```
//! use fluxtodo_core::environment::SystemClock;
//! use fluxtodo_runtime::StoreConfig;
//! use std::sync::Arc;
//! use todo::{App, TodoEnvironment};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = App::new(TodoEnvironment::new(Arc::new(SystemClock)), &StoreConfig::default());
//!
//! app.actions.create("buy milk")?;
//! let todo = app.todo_store.todos()[0].clone();
//!
//! app.actions.toggle_complete(&todo)?;
//! assert_eq!(app.todo_store.completed_count(), 1);
//!
//! app.actions.destroy(todo.id())?;
//! assert!(app.todo_store.can_undo());
//!
//! app.actions.undo_destroy()?;
//! assert_eq!(app.todo_store.count(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod actions;
pub mod app;
pub mod reducer;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use actions::{ActionsCreator, TodoAction, keys, kinds};
pub use app::App;
pub use reducer::{TodoEnvironment, TodoReducer};
pub use store::{TodoStore, TodoStoreChange};
pub use types::{Todo, TodoId, TodoState};
