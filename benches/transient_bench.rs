//! Benchmark for the transient batch mode.
//!
//! Compares TransientHashMap against its persistent counterpart and the
//! standard library HashMap for batch operations.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;
use triemap::{PersistentHashMap, TransientHashMap};

// =============================================================================
// TransientHashMap Benchmarks
// =============================================================================

fn benchmark_transient_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_hashmap_insert");

    for size in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("TransientHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut transient = TransientHashMap::new();
                    for index in 0..size {
                        transient.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(transient.persistent())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = PersistentHashMap::new();
                    for index in 0..size {
                        map = map.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = HashMap::new();
                for index in 0..size {
                    map.insert(black_box(index), black_box(index * 2));
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

fn benchmark_transient_update(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_hashmap_update");

    for size in [1_000, 10_000] {
        let persistent_map: PersistentHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("TransientHashMap", size),
            &size,
            |bencher, &size| {
                let map = persistent_map.clone();
                bencher.iter_batched(
                    || map.transient(),
                    |mut transient| {
                        for key in (0..size).step_by(10) {
                            transient.update_with(&black_box(key), |value| value + 1);
                        }
                        black_box(transient.persistent())
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = persistent_map.clone();
                    for key in (0..size).step_by(10) {
                        if let Some(new_map) = map.update(&black_box(key), |value| value + 1) {
                            map = new_map;
                        }
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

fn benchmark_transient_remove(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("transient_hashmap_remove");

    for size in [1_000, 10_000] {
        let persistent_map: PersistentHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("TransientHashMap", size),
            &size,
            |bencher, &size| {
                let map = persistent_map.clone();
                bencher.iter_batched(
                    || map.transient(),
                    |mut transient| {
                        for key in (0..size).step_by(10) {
                            transient.remove(&black_box(key));
                        }
                        black_box(transient.persistent())
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = persistent_map.clone();
                    for key in (0..size).step_by(10) {
                        map = map.remove(&black_box(key));
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// FromIterator Optimization Benchmark
// =============================================================================

fn benchmark_collect_optimization(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("collect_optimization");

    for size in [10_000, 100_000] {
        // FromIterator builds through a transient internally.
        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap_collect", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let map: PersistentHashMap<i32, i32> =
                        (0..size).map(|index| (index, index * 2)).collect();
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(
    benches,
    benchmark_transient_insert,
    benchmark_transient_update,
    benchmark_transient_remove,
    benchmark_collect_optimization,
);

criterion_main!(benches);
