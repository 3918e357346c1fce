// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Workload engine: composes the kernels into one unit of work per probe call.
//!
//! Two flavours share the same pipeline and differ only in key derivation,
//! cache policy, Fibonacci memoization and the trailing mixing stage:
//!
//! | flavour | key | cache | fib memo | mixing |
//! |---|---|---|---|---|
//! | managed | string DJB2 | FIFO, 5000 entries, `f64` | yes | no |
//! | native | integer DJB2 | direct-mapped, 1024 slots, `i32` | no | yes |
//!
//! Cache, statistics and memo state sit behind one mutex per engine.
//! Concurrent probe calls serialize on the stateful half of the pipeline;
//! the pure kernels (primality, matrix, mixing) run after the lock is dropped.

use std::hint::black_box;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::workload::cache::{
    BoundedCache, CacheCounters, DirectMappedCache, FifoCache, FIFO_CEILING,
};
use crate::workload::hash::{CacheKey, KeyDerivation};
use crate::workload::kernels::{
    fib_index, heavy_result, is_prime, matrix_reduce, mix_scratch, prime_candidate,
    SequenceMemo, SCRATCH_LEN,
};
use crate::workload::statistics::{Analysis, RunningStatistics};

/// Every this many calls the engine serializes a state snapshot and throws
/// it away, as part of the simulated cost.
pub const SNAPSHOT_INTERVAL: u64 = 10_000;

/// Which engine flavour produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineFlavor {
    Managed,
    Native,
}

impl std::fmt::Display for EngineFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managed => write!(f, "managed"),
            Self::Native => write!(f, "native"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// Everything one workload call produced. Transient: built per call and
/// dropped by the caller once the probe returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeCallRecord {
    pub a: i32,
    pub b: i32,
    pub key: CacheKey,
    pub outcome: CacheOutcome,
    /// Cached heavy result, widened to `f64` for both flavours.
    pub cached: f64,
    pub analysis: Analysis,
    pub fib_index: u32,
    pub fib_value: u64,
    pub is_prime: bool,
    pub matrix: i32,
    /// Sorted mixing buffer; native flavour only.
    pub scratch: Option<[i32; SCRATCH_LEN]>,
}

/// Point-in-time view of an engine's accumulated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    pub flavor: EngineFlavor,
    pub calls: u64,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub cache: CacheCounters,
    pub sample_count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub lifetime_mean: Option<f64>,
}

/// One workload engine as seen by probe callbacks.
pub trait Workload: Send + Sync {
    fn flavor(&self) -> EngineFlavor;

    /// Run the full pipeline for one probe call.
    fn run(&self, a: i32, b: i32) -> ProbeCallRecord;

    fn snapshot(&self) -> WorkloadSnapshot;
}

/// Value type a cache flavour stores for the heavy result.
pub trait CacheValue: Copy + Send + 'static {
    fn from_heavy(value: f64) -> Self;

    fn widen(self) -> f64;

    /// 32-bit view fed to the mixing stage.
    fn scalar(self) -> i32;
}

impl CacheValue for f64 {
    fn from_heavy(value: f64) -> Self {
        value
    }

    fn widen(self) -> f64 {
        self
    }

    fn scalar(self) -> i32 {
        self as i32
    }
}

impl CacheValue for i32 {
    fn from_heavy(value: f64) -> Self {
        // Saturating, NaN maps to 0.
        value as i32
    }

    fn widen(self) -> f64 {
        self as f64
    }

    fn scalar(self) -> i32 {
        self
    }
}

#[derive(Debug)]
struct EngineState<C> {
    cache: C,
    stats: RunningStatistics,
    sequence: SequenceMemo,
    calls: u64,
}

/// Workload engine generic over the cached value type and cache policy.
#[derive(Debug)]
pub struct WorkloadEngine<V, C> {
    flavor: EngineFlavor,
    derivation: KeyDerivation,
    mixing: bool,
    state: Mutex<EngineState<C>>,
    _value: std::marker::PhantomData<fn() -> V>,
}

/// Engine driven from managed probe callbacks.
pub type ManagedEngine = WorkloadEngine<f64, FifoCache<f64>>;

/// Engine behind the native `extern "C"` entry point.
pub type NativeEngine = WorkloadEngine<i32, DirectMappedCache<i32>>;

impl ManagedEngine {
    pub fn managed() -> Self {
        Self::with_parts(
            EngineFlavor::Managed,
            KeyDerivation::String,
            FifoCache::new(FIFO_CEILING),
            SequenceMemo::memoized(),
            false,
        )
    }
}

impl Default for ManagedEngine {
    fn default() -> Self {
        Self::managed()
    }
}

impl NativeEngine {
    pub fn native() -> Self {
        Self::with_parts(
            EngineFlavor::Native,
            KeyDerivation::Integer,
            DirectMappedCache::new(),
            SequenceMemo::iterative(),
            true,
        )
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::native()
    }
}

impl<V, C> WorkloadEngine<V, C>
where
    V: CacheValue,
    C: BoundedCache<V> + Send,
{
    fn with_parts(
        flavor: EngineFlavor,
        derivation: KeyDerivation,
        cache: C,
        sequence: SequenceMemo,
        mixing: bool,
    ) -> Self {
        Self {
            flavor,
            derivation,
            mixing,
            state: Mutex::new(EngineState {
                cache,
                stats: RunningStatistics::new(),
                sequence,
                calls: 0,
            }),
            _value: std::marker::PhantomData,
        }
    }

    // No kernel can panic mid-update, so a poisoned lock still guards
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, EngineState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_of(&self, state: &EngineState<C>) -> WorkloadSnapshot {
        WorkloadSnapshot {
            flavor: self.flavor,
            calls: state.calls,
            cache_size: state.cache.len(),
            cache_capacity: state.cache.capacity(),
            cache: state.cache.counters(),
            sample_count: state.stats.window().len(),
            min: state.stats.min(),
            max: state.stats.max(),
            lifetime_mean: state.stats.lifetime_mean(),
        }
    }
}

impl<V, C> Workload for WorkloadEngine<V, C>
where
    V: CacheValue,
    C: BoundedCache<V> + Send,
{
    fn flavor(&self) -> EngineFlavor {
        self.flavor
    }

    fn run(&self, a: i32, b: i32) -> ProbeCallRecord {
        let key = self.derivation.derive(a, b);

        let (outcome, cached, analysis, fib_index, fib_value) = {
            let mut state = self.lock();

            let (outcome, cached) = match state.cache.lookup(key) {
                Some(value) => (CacheOutcome::Hit, value),
                None => {
                    let value = V::from_heavy(heavy_result(a, b));
                    state.cache.store(key, value);
                    (CacheOutcome::Miss, value)
                }
            };

            let analysis = state.stats.observe(a as i64 + b as i64);
            let index = fib_index(a, b);
            let fib_value = state.sequence.nth(index);

            state.calls += 1;
            if state.calls % SNAPSHOT_INTERVAL == 0 {
                let snapshot = self.snapshot_of(&state);
                black_box(serde_json::to_string(&snapshot).map(|s| s.len()).ok());
            }

            (outcome, cached, analysis, index, fib_value)
        };

        let prime = is_prime(prime_candidate(a, b));
        let matrix = matrix_reduce(a, b);
        let scratch = self
            .mixing
            .then(|| black_box(mix_scratch(cached.scalar(), matrix, prime)));

        ProbeCallRecord {
            a,
            b,
            key,
            outcome,
            cached: cached.widen(),
            analysis,
            fib_index,
            fib_value,
            is_prime: prime,
            matrix,
            scratch,
        }
    }

    fn snapshot(&self) -> WorkloadSnapshot {
        let state = self.lock();
        self.snapshot_of(&state)
    }
}
