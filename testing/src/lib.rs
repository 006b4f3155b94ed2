//! # Flux Todo Testing
//!
//! Testing utilities and helpers for the Flux Todo architecture.
//!
//! This crate provides:
//! - Deterministic clocks for the `Clock` environment trait
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - A change-event recorder for stores ([`ChangeRecorder`])
//!
//! ## Example
//!
//! ```ignore
//! use fluxtodo_testing::{ChangeRecorder, test_clock};
//!
//! #[test]
//! fn create_emits_one_change() {
//!     let app = App::new(TodoEnvironment::new(Arc::new(test_clock())), &StoreConfig::default());
//!     let changes = ChangeRecorder::attach(app.todo_store.emitter());
//!
//!     app.actions.create("buy milk").unwrap();
//!
//!     assert_eq!(changes.count(), 1);
//! }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use fluxtodo_core::environment::Clock;


pub use reducer_test::ReducerTest;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use fluxtodo_testing::mocks::FixedClock;
    /// use fluxtodo_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(Utc.timestamp_millis_opt(TEST_EPOCH_MILLIS).single().unwrap_or_default())
    }

    /// Milliseconds of the default test instant, 2025-01-01 00:00:00 UTC
    pub const TEST_EPOCH_MILLIS: i64 = 1_735_689_600_000;

    /// Clock that only moves when told to
    ///
    /// Useful for exercising id allocation across ticks, including a clock
    /// that steps backwards.
    ///
    /// ```
    /// use fluxtodo_testing::mocks::ManualClock;
    /// use fluxtodo_core::environment::Clock;
    ///
    /// let clock = ManualClock::at_millis(1_000);
    /// clock.advance_millis(5);
    /// assert_eq!(clock.now_millis(), 1_005);
    /// ```
    #[derive(Debug, Default)]
    pub struct ManualClock {
        millis: AtomicI64,
    }

    impl ManualClock {
        /// Create a clock reading `millis` since the epoch
        #[must_use]
        pub const fn at_millis(millis: i64) -> Self {
            Self {
                millis: AtomicI64::new(millis),
            }
        }

        /// Move the clock forward (or backward, with a negative delta)
        pub fn advance_millis(&self, delta: i64) {
            self.millis.fetch_add(delta, Ordering::SeqCst);
        }

        /// Jump to an absolute reading
        pub fn set_millis(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(self.now_millis())
                .single()
                .unwrap_or_default()
        }

        fn now_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use fluxtodo_runtime::{ChangeEmitter, ListenerId};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Records every change event an emitter delivers
    ///
    /// Cloning shares the underlying log.
    #[derive(Debug, Clone)]
    pub struct ChangeRecorder<E> {
        events: Arc<Mutex<Vec<E>>>,
        listener: Option<ListenerId>,
    }

    impl<E> ChangeRecorder<E>
    where
        E: Clone + Send + 'static,
    {
        /// Subscribe a new recorder to `emitter`
        #[must_use]
        pub fn attach(emitter: &ChangeEmitter<E>) -> Self {
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            let listener = emitter.subscribe(move |event: &E| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(event.clone());
            });
            Self {
                events,
                listener: Some(listener),
            }
        }

        /// The listener id, for unsubscribing
        #[must_use]
        pub const fn listener(&self) -> Option<ListenerId> {
            self.listener
        }

        /// Number of events recorded so far
        #[must_use]
        pub fn count(&self) -> usize {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Copy of every recorded event
        #[must_use]
        pub fn events(&self) -> Vec<E> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Forget everything recorded so far
        pub fn clear(&self) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    /// Install a `tracing` subscriber for test output
    ///
    /// Honors `RUST_LOG`. Safe to call from every test; only the first call
    /// installs anything.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::{ChangeRecorder, init_test_tracing};
pub use mocks::{FixedClock, ManualClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use fluxtodo_runtime::ChangeEmitter;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(clock.now_millis(), mocks::TEST_EPOCH_MILLIS);
    }

    #[test]
    fn manual_clock_moves_both_ways() {
        let clock = ManualClock::at_millis(100);
        clock.advance_millis(10);
        assert_eq!(clock.now_millis(), 110);
        clock.advance_millis(-50);
        assert_eq!(clock.now_millis(), 60);
        clock.set_millis(7);
        assert_eq!(clock.now().timestamp_millis(), 7);
    }

    #[test]
    fn recorder_captures_events() {
        let emitter = ChangeEmitter::new(4);
        let recorder = ChangeRecorder::attach(&emitter);

        emitter.emit(&1_u32);
        emitter.emit(&2_u32);
        assert_eq!(recorder.events(), vec![1, 2]);

        recorder.clear();
        assert_eq!(recorder.count(), 0);

        assert!(emitter.unsubscribe(recorder.listener().unwrap()));
        emitter.emit(&3_u32);
        assert_eq!(recorder.count(), 0);
    }
}
