// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Native workload for hookbench probes.
//!
//! Builds as a `cdylib` exporting one entry point a probe can call directly:
//!
//! ```c
//! void perform_complex_operations(int a, int b);
//! ```
//!
//! Each call runs the native engine flavour (integer DJB2 key, 1024-slot
//! direct-mapped cache, mixing stage) against process-wide state created on
//! first use. Nothing is returned; the work is the point. Accumulated state
//! can be read back with `hookbench_native_stats`.
//!
//! Both functions are safe to call from any thread.

use std::ffi::c_int;
use std::hint::black_box;
use std::sync::OnceLock;

use hookbench_core::workload::{NativeEngine, Workload, WorkloadSnapshot};
use hookbench_core::NativeWorkload;

/// Result codes for FFI functions.
pub const HOOKBENCH_OK: i32 = 0;
pub const HOOKBENCH_ERR_NULL_PTR: i32 = -1;

static ENGINE: OnceLock<NativeEngine> = OnceLock::new();

/// Process-wide native engine, created on first use.
pub fn engine() -> &'static NativeEngine {
    ENGINE.get_or_init(NativeEngine::native)
}

/// Current state of the process-wide engine.
pub fn snapshot() -> WorkloadSnapshot {
    engine().snapshot()
}

/// Entry point and state reader, as `ProbeHarness::new` takes them.
pub fn native_workload() -> NativeWorkload {
    NativeWorkload {
        entry: perform_complex_operations,
        snapshot,
    }
}

/// Run the native workload once for `(a, b)`.
#[no_mangle]
pub extern "C" fn perform_complex_operations(a: c_int, b: c_int) {
    black_box(engine().run(a, b));
}

/// Accumulated engine state, laid out for C callers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HookbenchNativeStats {
    pub calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_size: u32,
    pub cache_capacity: u32,
    pub sample_count: u32,
    /// Non-zero once at least one call has been observed; `min`, `max` and
    /// `mean` are meaningless before that.
    pub has_samples: u32,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
}

impl From<WorkloadSnapshot> for HookbenchNativeStats {
    fn from(s: WorkloadSnapshot) -> Self {
        Self {
            calls: s.calls,
            cache_hits: s.cache.hits,
            cache_misses: s.cache.misses,
            cache_size: s.cache_size as u32,
            cache_capacity: s.cache_capacity as u32,
            sample_count: s.sample_count as u32,
            has_samples: s.lifetime_mean.is_some() as u32,
            min: s.min.unwrap_or_default(),
            max: s.max.unwrap_or_default(),
            mean: s.lifetime_mean.unwrap_or_default(),
        }
    }
}

/// Copy the current engine state into `out`.
///
/// # Safety
/// `out` must point to a valid, writable `HookbenchNativeStats`.
#[no_mangle]
pub unsafe extern "C" fn hookbench_native_stats(out: *mut HookbenchNativeStats) -> i32 {
    if out.is_null() {
        return HOOKBENCH_ERR_NULL_PTR;
    }
    *out = snapshot().into();
    HOOKBENCH_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbench_core::workload::EngineFlavor;
    use hookbench_core::{
        HarnessConfig, InProcessInterceptor, ProbeHarness, Strategy, Target, TargetCaller,
        TargetConfig, TargetLibrary,
    };
    use std::sync::Arc;

    // The engine is process-wide, so assertions are on deltas.

    #[test]
    fn test_entry_point_accumulates() {
        let mut before = HookbenchNativeStats::default();
        assert_eq!(unsafe { hookbench_native_stats(&mut before) }, HOOKBENCH_OK);

        perform_complex_operations(3, 4);
        perform_complex_operations(3, 4);

        let mut after = HookbenchNativeStats::default();
        assert_eq!(unsafe { hookbench_native_stats(&mut after) }, HOOKBENCH_OK);

        assert!(after.calls >= before.calls + 2);
        assert!(after.cache_hits > before.cache_hits);
        assert_eq!(after.cache_capacity, 1024);
        assert_eq!(after.has_samples, 1);
    }

    #[test]
    fn test_stats_rejects_null() {
        assert_eq!(
            unsafe { hookbench_native_stats(std::ptr::null_mut()) },
            HOOKBENCH_ERR_NULL_PTR
        );
    }

    #[test]
    fn test_entry_point_matches_harness_signature() {
        let entry: hookbench_core::NativeEntry = perform_complex_operations;
        entry(-5, 9);
        assert!(engine().snapshot().calls >= 1);
    }

    #[tokio::test]
    async fn test_harness_stats_report_native_engine() {
        let interceptor = Arc::new(InProcessInterceptor::new());
        let harness = ProbeHarness::new(
            HarnessConfig::for_strategy(Strategy::ComplexNative),
            vec![TargetConfig::from(Target::ComputeSumComplex)],
            Arc::new(TargetLibrary::resolver()),
            interceptor.clone(),
            Some(native_workload()),
        )
        .unwrap();
        assert_eq!(harness.install().await.hooked_count(), 1);

        let before = snapshot().calls;
        let caller = TargetCaller::new(&interceptor);
        for i in 0..10 {
            caller.compute_sum_complex(i, 2 * i);
        }

        let stats = harness.stats();
        assert_eq!(stats.probes.workload_runs, 20);
        assert_eq!(stats.workload.flavor, EngineFlavor::Native);
        assert!(stats.workload.calls >= before + 20);
        assert!(stats.workload.cache.lookups() >= 20);
        assert_eq!(stats.workload.cache_capacity, 1024);
    }
}
