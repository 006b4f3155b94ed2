//! # Flux Todo Runtime
//!
//! Runtime implementation for the Flux Todo architecture.
//!
//! This crate provides the pieces that move actions through the system:
//!
//! - **Dispatcher**: The single channel every action flows through. It
//!   assembles an [`Action`](fluxtodo_core::Action) and hands it, synchronously
//!   and in subscription order, to every registered handler.
//! - **Store contract**: The [`Store`] trait every concrete store implements,
//!   and the [`ChangeEmitter`] that delivers its change events.
//!
//! ## Execution Model
//!
//! Everything here is synchronous. `dispatch` builds the action, runs every
//! handler, and each handler mutates its state and emits its change event
//! before `dispatch` returns. There is no queue, no suspension point and no
//! cancellation.
//!
//! Handlers must not dispatch from inside `on_action`. This is a documented
//! constraint, not an enforced one.
//!
//! ## Example
//!
//! ```ignore
//! use fluxtodo_runtime::{Dispatcher, Store, StoreConfig};
//!
//! let dispatcher = Dispatcher::new();
//! let store = MyStore::registered(&dispatcher, environment, &StoreConfig::default());
//!
//! store.emitter().subscribe(|_change| println!("state changed"));
//! dispatcher.dispatch("my-kind", &["my-key".into(), 42.into()])?;
//! ```

/// Action dispatcher and the handler trait it delivers to
pub mod dispatcher;

/// Store base contract and change notification
pub mod store;

/// Error types for the runtime
pub mod error {
    use crate::dispatcher::HandlerId;
    use fluxtodo_core::ActionError;
    use thiserror::Error;

    /// Errors a store can report while handling an action
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The action kind is recognized but its payload is not usable
        ///
        /// The store does not mutate state or emit a change when this is
        /// returned.
        #[error("Malformed payload: {0}")]
        MalformedPayload(#[from] ActionError),
    }

    /// Errors that abort a single dispatch
    ///
    /// None of these are fatal to the process. State already mutated by
    /// handlers that ran before the failing one is kept.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum DispatchError {
        /// The flattened payload did not contain key/value pairs
        #[error("Payload has {0} entries; expected alternating key/value pairs")]
        OddPayload(usize),

        /// The action could not be built
        #[error(transparent)]
        Action(#[from] ActionError),

        /// A subscribed handler rejected the action
        ///
        /// Handlers subscribed after the failing one do not see the action.
        #[error("Handler {handler} rejected '{kind}': {source}")]
        Handler {
            /// The failing handler
            handler: HandlerId,
            /// Kind of the rejected action
            kind: String,
            /// What the handler reported
            #[source]
            source: StoreError,
        },
    }
}

pub use dispatcher::{ActionHandler, Dispatcher, HandlerId};
pub use error::{DispatchError, StoreError};
pub use store::{ChangeEmitter, ListenerId, Store, StoreConfig};
