//! Benchmark for PersistentHashMap.
//!
//! Compares the persistent map against the standard library HashMap for
//! point operations, and measures the cost of structural-sharing updates.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;
use triemap::PersistentHashMap;

// =============================================================================
// Insert Benchmarks
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("persistent_hashmap_insert");

    for size in [1_000, 10_000, 100_000] {
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

// =============================================================================
// Get Benchmarks
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("persistent_hashmap_get");

    for size in [1_000, 10_000, 100_000] {
        let persistent_map: PersistentHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();
        let std_map: HashMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut total = 0i64;
                    for index in 0..size {
                        if let Some(value) = persistent_map.get(&black_box(index)) {
                            total += i64::from(*value);
                        }
                    }
                    black_box(total)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("HashMap", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut total = 0i64;
                for index in 0..size {
                    if let Some(value) = std_map.get(&black_box(index)) {
                        total += i64::from(*value);
                    }
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Remove Benchmarks
// =============================================================================

fn benchmark_remove(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("persistent_hashmap_remove");

    for size in [1_000, 10_000] {
        let persistent_map: PersistentHashMap<i32, i32> =
            (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentHashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = persistent_map.clone();
                    for index in (0..size).step_by(10) {
                        map = map.remove(&black_box(index));
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Structural Sharing Benchmarks
// =============================================================================

fn benchmark_single_update_on_large_map(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("persistent_hashmap_single_update");

    for size in [10_000, 100_000] {
        let persistent_map: PersistentHashMap<i32, i32> =
            (0..size).map(|index| (index, index)).collect();

        // A single insert copies only the path from root to leaf.
        group.bench_with_input(
            BenchmarkId::new("path_copy", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| black_box(persistent_map.insert(black_box(size / 2), 999)));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Merge Benchmarks
// =============================================================================

fn benchmark_merge(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("persistent_hashmap_merge");

    for size in [1_000, 10_000] {
        let left: PersistentHashMap<i32, i32> = (0..size).map(|index| (index, index)).collect();
        let right: PersistentHashMap<i32, i32> =
            (size / 2..size + size / 2).map(|index| (index, index)).collect();

        group.bench_with_input(BenchmarkId::new("merge", size), &size, |bencher, _| {
            bencher.iter(|| black_box(left.merge(&right)));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_get,
    benchmark_remove,
    benchmark_single_update_on_large_map,
    benchmark_merge,
);

criterion_main!(benches);
