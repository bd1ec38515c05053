//! # Enqueue Benchmark
//!
//! Measures the producer path (per-item and bulk appends, parallel writers)
//! and the consumer path (ordered copy-out).
//!
//! Run with: `cargo bench --package shardbuf_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shardbuf_core::{
    EventQueue, PayloadEventQueue, QueueConfig, ShardSlot, DEFAULT_SHARD_ID,
};

/// Records per benchmark iteration.
const RECORD_COUNT: usize = 100_000;

#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct Event {
    entity: u32,
    kind: u32,
    value: f32,
    _padding: f32,
}

fn config() -> QueueConfig {
    QueueConfig::persistent().with_worker_count(8)
}

/// Benchmark: one record per append on the default shard.
fn bench_single_enqueue(c: &mut Criterion) {
    let mut queue = EventQueue::<Event>::new(&config()).unwrap();
    c.bench_function("enqueue_single_100K", |b| {
        b.iter(|| {
            queue.clear();
            let mut writer = queue.writer(DEFAULT_SHARD_ID).unwrap();
            for i in 0..RECORD_COUNT {
                writer
                    .enqueue(Event { entity: i as u32, ..Event::default() })
                    .unwrap();
            }
            black_box(writer.len())
        });
    });
}

/// Benchmark: the whole batch as one append.
fn bench_bulk_enqueue(c: &mut Criterion) {
    let events = vec![Event::default(); RECORD_COUNT];
    let mut queue = EventQueue::<Event>::new(&config()).unwrap();
    c.bench_function("enqueue_bulk_100K", |b| {
        b.iter(|| {
            queue.clear();
            queue.enqueue_slice(DEFAULT_SHARD_ID, black_box(&events)).unwrap();
            queue.component_count()
        });
    });
}

/// Benchmark: every worker slot appending concurrently.
fn bench_parallel_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_parallel");
    for workers in [1usize, 4, 8] {
        let mut queue =
            EventQueue::<Event>::new(&QueueConfig::persistent().with_worker_count(workers))
                .unwrap();
        let per_worker = RECORD_COUNT / workers;
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, _| {
            b.iter(|| {
                queue.clear();
                std::thread::scope(|s| {
                    for mut writer in queue.writers() {
                        if writer.shard_id() == DEFAULT_SHARD_ID {
                            continue;
                        }
                        s.spawn(move || {
                            for i in 0..per_worker {
                                writer
                                    .enqueue(Event { entity: i as u32, ..Event::default() })
                                    .unwrap();
                            }
                        });
                    }
                });
                queue.component_count()
            });
        });
    }
    group.finish();
}

/// Benchmark: record + link + payload per enqueue.
fn bench_payload_enqueue(c: &mut Criterion) {
    let payload = [7u32; 16];
    let mut queue = PayloadEventQueue::<Event, u32>::new(&config()).unwrap();
    c.bench_function("enqueue_payload_16_x_100K", |b| {
        b.iter(|| {
            queue.clear();
            let mut writer = queue.writer(DEFAULT_SHARD_ID).unwrap();
            for _ in 0..RECORD_COUNT {
                writer.enqueue(Event::default(), black_box(&payload)).unwrap();
            }
            black_box(writer.payload_len())
        });
    });
}

/// Benchmark: ordered copy-out across shards.
fn bench_copy_out(c: &mut Criterion) {
    let mut queue = EventQueue::<Event>::new(&config()).unwrap();
    for mut writer in queue.writers() {
        writer
            .enqueue_slice(&vec![Event::default(); RECORD_COUNT / 9])
            .unwrap();
    }
    let mut dest = vec![Event::default(); queue.component_count()];
    c.bench_function("copy_out_100K", |b| {
        b.iter(|| {
            queue.copy_to(black_box(&mut dest)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_single_enqueue,
    bench_bulk_enqueue,
    bench_parallel_enqueue,
    bench_payload_enqueue,
    bench_copy_out,
);
criterion_main!(benches);
