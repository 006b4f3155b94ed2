//! Dispatcher and change-notification benchmarks
//!
//! Measures the synchronous hot path: building an action from flattened
//! entries, fanning it out to handlers, and emitting store changes.
//!
//! Run with: `cargo bench -p fluxtodo-runtime`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::unwrap_used)] // Benchmarks can unwrap in setup

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fluxtodo_core::Action;
use fluxtodo_runtime::{ActionHandler, ChangeEmitter, Dispatcher, Store, StoreError};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// Store that counts actions and emits a change for each one
struct CountingStore {
    seen: AtomicU64,
    emitter: ChangeEmitter<u64>,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            seen: AtomicU64::new(0),
            emitter: ChangeEmitter::new(16),
        }
    }
}

impl ActionHandler for CountingStore {
    fn on_action(&self, _action: &Action) -> Result<(), StoreError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        self.emit_store_change();
        Ok(())
    }
}

impl Store for CountingStore {
    type ChangeEvent = u64;

    fn change_event(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }

    fn emitter(&self) -> &ChangeEmitter<u64> {
        &self.emitter
    }
}

/// Benchmark action construction alone
fn benchmark_action_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("action_build");
    group.throughput(Throughput::Elements(1));

    group.bench_function("no_payload", |b| {
        b.iter(|| Action::with_kind(black_box("todo-undo-destroy")).build().unwrap());
    });

    group.bench_function("one_entry", |b| {
        b.iter(|| {
            Action::with_kind("todo-create")
                .bundle("key-text", black_box("buy milk"))
                .unwrap()
                .build()
                .unwrap()
        });
    });

    group.finish();
}

/// Benchmark dispatch fan-out by handler count
fn benchmark_dispatch_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_fanout");
    group.throughput(Throughput::Elements(1));

    for handlers in [1_usize, 4, 16] {
        let dispatcher = Dispatcher::new();
        for _ in 0..handlers {
            Store::register(&Arc::new(CountingStore::new()), &dispatcher);
        }
        let entries = [json!("key-id"), json!(42)];

        group.bench_with_input(BenchmarkId::from_parameter(handlers), &handlers, |b, _| {
            b.iter(|| dispatcher.dispatch(black_box("todo-complete"), &entries).unwrap());
        });
    }

    group.finish();
}

/// Benchmark change emission with sync listeners and a stream subscriber
fn benchmark_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    group.throughput(Throughput::Elements(1));

    group.bench_function("no_listeners", |b| {
        let emitter = ChangeEmitter::new(16);
        b.iter(|| emitter.emit(black_box(&1_u64)));
    });

    group.bench_function("four_listeners", |b| {
        let emitter = ChangeEmitter::new(16);
        for _ in 0..4 {
            emitter.subscribe(|event: &u64| {
                black_box(event);
            });
        }
        b.iter(|| emitter.emit(black_box(&1_u64)));
    });

    group.bench_function("with_stream", |b| {
        let emitter = ChangeEmitter::new(16);
        let mut stream = emitter.subscribe_stream();
        b.iter(|| {
            emitter.emit(black_box(&1_u64));
            let _ = stream.try_recv();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_action_build,
    benchmark_dispatch_fanout,
    benchmark_emit
);
criterion_main!(benches);
