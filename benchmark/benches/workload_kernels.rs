// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Workload engine microbenchmarks.
//!
//! Measures each numeric kernel on its own and one full engine call per
//! flavour, cold (distinct inputs) and warm (repeated input).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hookbench_core::workload::cache::{BoundedCache, DirectMappedCache, FifoCache};
use hookbench_core::workload::hash::{integer_key, string_key};
use hookbench_core::workload::kernels::{
    heavy_result, insertion_sort, is_prime, matrix_reduce, mix_scratch, SequenceMemo, FIB_MAX,
};
use hookbench_core::workload::RunningStatistics;
use hookbench_core::{ManagedEngine, NativeEngine, Workload};
use std::time::Duration;

/// Benchmark the two key derivations.
fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");

    group.bench_function("string", |b| {
        b.iter(|| string_key(black_box(1234), black_box(-5678)))
    });
    group.bench_function("integer", |b| {
        b.iter(|| integer_key(black_box(1234), black_box(-5678)))
    });

    group.finish();
}

/// Benchmark cache lookup + store under a rolling key set.
fn bench_caches(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_lookup_store");

    group.bench_function("direct_mapped", |b| {
        let mut cache: DirectMappedCache<i32> = DirectMappedCache::new();
        let mut i = 0i32;
        b.iter(|| {
            let key = integer_key(i, i + 1);
            if cache.lookup(key).is_none() {
                cache.store(key, i);
            }
            i = i.wrapping_add(1) % 4096;
        })
    });

    group.bench_function("fifo", |b| {
        let mut cache: FifoCache<f64> = FifoCache::default();
        let mut i = 0i32;
        b.iter(|| {
            let key = string_key(i, i + 1);
            if cache.lookup(key).is_none() {
                cache.store(key, i as f64);
            }
            i = i.wrapping_add(1) % 8192;
        })
    });

    group.finish();
}

/// Benchmark the pure numeric kernels.
fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");

    group.bench_function("heavy_result", |b| {
        b.iter(|| heavy_result(black_box(3), black_box(4)))
    });
    group.bench_function("matrix_reduce", |b| {
        b.iter(|| matrix_reduce(black_box(3), black_box(4)))
    });
    group.bench_function("is_prime", |b| b.iter(|| is_prime(black_box(1_000_003))));
    group.bench_function("mix_and_sort", |b| {
        b.iter(|| {
            let mut scratch = mix_scratch(black_box(7), black_box(-12), true);
            insertion_sort(&mut scratch);
            scratch
        })
    });

    for (name, mut memo) in [
        ("iterative", SequenceMemo::iterative()),
        ("memoized", SequenceMemo::memoized()),
    ] {
        group.bench_with_input(BenchmarkId::new("fibonacci", name), &FIB_MAX, |b, &n| {
            b.iter(|| memo.nth(black_box(n)))
        });
    }

    group.bench_function("running_statistics", |b| {
        let mut stats: RunningStatistics = RunningStatistics::new();
        let mut v = 0i64;
        b.iter(|| {
            v = (v + 7919) % 10_007;
            stats.observe(black_box(v))
        })
    });

    group.finish();
}

/// Benchmark one full engine call per flavour.
fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");
    group.measurement_time(Duration::from_secs(5));

    let managed = ManagedEngine::managed();
    let native = NativeEngine::native();

    group.bench_function("managed_warm", |b| b.iter(|| managed.run(black_box(3), black_box(4))));
    group.bench_function("native_warm", |b| b.iter(|| native.run(black_box(3), black_box(4))));

    let mut i = 0i32;
    group.bench_function("managed_cold", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            managed.run(i, i.wrapping_mul(31))
        })
    });
    let mut j = 0i32;
    group.bench_function("native_cold", |b| {
        b.iter(|| {
            j = j.wrapping_add(1);
            native.run(j, j.wrapping_mul(31))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_key_derivation,
    bench_caches,
    bench_kernels,
    bench_engine,
);

criterion_main!(benches);
