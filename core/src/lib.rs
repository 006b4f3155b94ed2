//! # Flux Todo Core
//!
//! Core traits and types for the Flux Todo architecture.
//!
//! This crate provides the pieces every other crate in the workspace builds
//! on: the validated [`Action`](action::Action) message, the
//! [`Reducer`](reducer::Reducer) trait that holds business logic, and the
//! environment traits used to inject dependencies such as the clock.
//!
//! ## Core Concepts
//!
//! - **Action**: Immutable message with a kind tag and a key/value payload
//! - **State**: Domain state owned by exactly one store
//! - **Reducer**: Pure function `(State, Action, Environment) → State`
//! - **Environment**: Injected dependencies via traits
//!
//! ## Data Flow
//!
//! ```text
//! intent ─► Dispatcher ─► Store::on_action ─► Reducer ─► change event ─► listeners
//! ```
//!
//! The dispatcher and store live in `fluxtodo-runtime`; this crate has no
//! runtime behavior of its own.
//!
//! ## Example
//!
//! ```ignore
//! use fluxtodo_core::reducer::Reducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut CounterState, action: CounterAction, _env: &()) {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

/// Action values and the builder that validates them
pub mod action;

pub use action::{Action, ActionBuilder, ActionError, Value};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → State`
///
/// They contain all business logic and are deterministic and testable.
/// Stores wrap a reducer with locking and change notification.
pub mod reducer {
    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TodoReducer {
    ///     type State = TodoState;
    ///     type Action = TodoAction;
    ///     type Environment = TodoEnvironment;
    ///
    ///     fn reduce(&self, state: &mut TodoState, action: TodoAction, env: &TodoEnvironment) {
    ///         match action {
    ///             TodoAction::Create { text } => { /* ... */ }
    ///             // ...
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment);
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// Current time as integer milliseconds since the Unix epoch
        fn now_millis(&self) -> i64 {
            self.now().timestamp_millis()
        }
    }

    /// Production clock backed by the system wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_millis_match_now() {
        let clock = SystemClock;
        let before = clock.now().timestamp_millis();
        let millis = clock.now_millis();
        assert!(millis >= before);
    }
}
