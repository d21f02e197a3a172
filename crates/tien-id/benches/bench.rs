use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicU64, Ordering},
    },
    thread::scope,
    time::{Duration, Instant},
};
use tien_id::{CachedClock, NodeId, SnowflakeGenerator, SystemClock, TimeSource};

/// Advances one millisecond per full sequence so the hot path never waits.
struct SteppingMockTime {
    reads: AtomicU64,
}

impl TimeSource for SteppingMockTime {
    fn current_millis(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::Relaxed) / 4096
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

fn node() -> NodeId {
    NodeId::new(1, 1).unwrap()
}

fn bench_generator<T>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> SnowflakeGenerator<T>,
) where
    T: TimeSource,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = Duration::ZERO;
            for _ in 0..iters {
                let generator = generator_factory();
                let start = Instant::now();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().unwrap());
                }
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

fn bench_generator_contended<T>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> SnowflakeGenerator<T>,
) where
    T: TimeSource + Clone + Send + Sync,
{
    let threads = num_cpus::get().max(2);
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{threads}/elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = Duration::ZERO;
            for _ in 0..iters {
                let generator = generator_factory();
                let barrier = Arc::new(Barrier::new(threads + 1));
                let start = scope(|s| {
                    for _ in 0..threads {
                        let generator = generator.clone();
                        let barrier = Arc::clone(&barrier);
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id().unwrap());
                            }
                        });
                    }
                    barrier.wait();
                    Instant::now()
                });
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

fn benchmarks(c: &mut Criterion) {
    bench_generator(c, "generator/mock", || {
        SnowflakeGenerator::builder(
            node(),
            SteppingMockTime {
                reads: AtomicU64::new(0),
            },
        )
        .epoch(Duration::ZERO)
        .build()
    });

    bench_generator(c, "generator/system_clock", || {
        SnowflakeGenerator::new(node(), SystemClock)
    });

    let cached = CachedClock::default();
    bench_generator(c, "generator/cached_clock", || {
        SnowflakeGenerator::new(node(), cached.clone())
    });

    bench_generator_contended(c, "generator/contended/system_clock", || {
        SnowflakeGenerator::new(node(), SystemClock)
    });

    bench_generator_contended(c, "generator/contended/cached_clock", || {
        SnowflakeGenerator::new(node(), cached.clone())
    });

    let mut group = c.benchmark_group("clock");
    group.bench_function("system", |b| {
        b.iter(|| black_box(SystemClock.current_millis()))
    });
    group.bench_function("cached", |b| {
        b.iter(|| black_box(cached.current_millis()))
    });
    group.finish();

    cached.shutdown();
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
