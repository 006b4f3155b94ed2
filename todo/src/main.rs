//! Command-line walkthrough of the todo store.
//!
//! Creates a todo, flips it, toggles everything, destroys it and restores it,
//! printing the list after each step. A background task follows the store's
//! change stream and logs every revision it sees.
//!
//! Set `RUST_LOG` to adjust verbosity, e.g. `RUST_LOG=todo=trace`.

use fluxtodo_core::environment::SystemClock;
use fluxtodo_runtime::{Store, StoreConfig};
use std::sync::Arc;
use todo::{App, TodoEnvironment, TodoStore};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=debug,fluxtodo_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Todo Example ===\n");

    let app = App::new(
        TodoEnvironment::new(Arc::new(SystemClock)),
        &StoreConfig::default(),
    );

    let mut changes = app.todo_store.emitter().subscribe_stream();
    let watcher = tokio::spawn(async move {
        let mut seen = 0_u64;
        loop {
            match changes.recv().await {
                Ok(change) => {
                    seen += 1;
                    tracing::info!(revision = change.revision, "Store changed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        seen
    });

    println!("Creating 'buy milk'...");
    app.actions.create("buy milk")?;
    print_todos(&app.todo_store);

    let Some(todo) = app.todo_store.todos().into_iter().next() else {
        anyhow::bail!("store is empty after create");
    };

    println!("\nToggling 'buy milk'...");
    app.actions.toggle_complete(&todo)?;
    print_todos(&app.todo_store);

    println!("\nToggling all...");
    app.actions.toggle_complete_all()?;
    print_todos(&app.todo_store);

    println!("\nDestroying 'buy milk'...");
    app.actions.destroy(todo.id())?;
    print_todos(&app.todo_store);
    println!("Can undo: {}", app.todo_store.can_undo());

    println!("\nUndoing destroy...");
    app.actions.undo_destroy()?;
    print_todos(&app.todo_store);

    // Dropping the context drops the last sender and closes the stream.
    drop(app);
    let seen = watcher.await?;
    println!("\nChange notifications received: {seen}");

    println!("\n=== Example Complete ===");
    Ok(())
}

fn print_todos(store: &TodoStore) {
    store.with_todos(|todos| {
        if todos.is_empty() {
            println!("  (no todos)");
        }
        for todo in todos {
            let status = if todo.is_complete() { "✓" } else { " " };
            println!("  [{status}] {} ({})", todo.text(), todo.id());
        }
    });
    println!(
        "  Completed: {}/{}",
        store.completed_count(),
        store.count()
    );
}
