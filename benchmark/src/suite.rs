// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Strategy × target overhead suite.
//!
//! Every (method, target) pair gets a fresh interceptor and, for probed
//! methods, a harness hooking only that target, so probe counters in the
//! result metadata belong to that pair alone. Baseline calls go through the
//! same dispatch path with nothing attached.

use std::hint::black_box;
use std::sync::Arc;

use hookbench_core::{
    HarnessConfig, HookResult, InProcessInterceptor, ProbeHarness, Target, TargetCaller,
    TargetConfig, TargetLibrary, WorkloadConfig,
};

use crate::harness::BenchmarkHarness;
use crate::metrics::{BenchmarkResult, Method};

/// Length of the array summed by `process_array`.
pub const ARRAY_LEN: usize = 1000;

/// Argument to `factorial`.
pub const FACTORIAL_N: i32 = 20;

/// Block size for `allocate_and_free`.
pub const ALLOCATION_SIZE: usize = 1024;

/// Shape of one suite run.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub warmup: u64,
    pub iterations: u64,
    pub workload: WorkloadConfig,
    /// Divide every call count by this (quick runs)
    pub scale_down: u64,
    pub keep_samples: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            warmup: 1,
            iterations: 5,
            workload: WorkloadConfig::default(),
            scale_down: 1,
            keep_samples: true,
        }
    }
}

impl SuiteConfig {
    /// Calls per sample for `target`.
    pub fn calls_for(&self, target: Target) -> u64 {
        let w = &self.workload;
        let calls = match target {
            Target::ComputeSum => w.hot_iterations,
            Target::Factorial => w.recursive_iterations,
            Target::ProcessArray => w.array_iterations,
            Target::AllocateAndFree | Target::TestIntercept => w.memory_iterations,
            Target::ComputeSumHeavy | Target::ComputeSumComplex => w.complex_iterations,
        };
        (calls / self.scale_down.max(1)).max(1)
    }
}

/// Argument state reused across calls to one target.
struct TargetDriver {
    values: Vec<i32>,
    out: i32,
}

impl TargetDriver {
    fn new() -> Self {
        Self {
            values: (0..ARRAY_LEN as i32).collect(),
            out: 0,
        }
    }

    fn call(&mut self, caller: &TargetCaller<'_>, target: Target, i: u64) {
        let i = i as i32;
        match target {
            Target::ComputeSum => {
                black_box(caller.compute_sum(i, i.wrapping_add(1)));
            }
            Target::ComputeSumHeavy => {
                black_box(caller.compute_sum_heavy(i, i.wrapping_add(1)));
            }
            Target::ComputeSumComplex => {
                black_box(caller.compute_sum_complex(i, i.wrapping_add(1)));
            }
            Target::Factorial => {
                black_box(caller.factorial(black_box(FACTORIAL_N)));
            }
            Target::ProcessArray => {
                black_box(caller.process_array(&self.values, &mut self.out));
            }
            Target::AllocateAndFree => {
                black_box(caller.allocate_and_free(ALLOCATION_SIZE));
            }
            Target::TestIntercept => {
                black_box(caller.test_intercept());
            }
        }
    }
}

/// Time `target` under `method`.
pub async fn run_pair(
    method: Method,
    target: Target,
    config: &SuiteConfig,
) -> HookResult<BenchmarkResult> {
    let interceptor = Arc::new(InProcessInterceptor::new());

    let harness = match method.strategy() {
        Some(strategy) => {
            let harness = ProbeHarness::new(
                HarnessConfig::for_strategy(strategy),
                vec![TargetConfig::from(target)],
                Arc::new(TargetLibrary::resolver()),
                interceptor.clone(),
                Some(hookbench_native::native_workload()),
            )?;
            harness.install().await;
            Some(harness)
        }
        None => None,
    };

    let calls = config.calls_for(target);
    let bench = BenchmarkHarness::new()
        .warmup(config.warmup)
        .iterations(config.iterations)
        .keep_samples(config.keep_samples);

    let caller = TargetCaller::new(&interceptor);
    let mut driver = TargetDriver::new();
    let samples = bench.run_batched(calls, |i| driver.call(&caller, target, i));

    let mut result = BenchmarkResult::new(
        target.name(),
        method,
        samples,
        calls,
        bench.should_keep_samples(),
    );

    if let Some(harness) = harness {
        let stats = harness.stats();
        result = result
            .with_metadata("probes", stats.probes)
            .with_metadata("workload", &stats.workload);
        harness.uninstall();
    }

    Ok(result)
}

/// Time every target under every method, method-major.
pub async fn run_suite(
    methods: &[Method],
    targets: &[Target],
    config: &SuiteConfig,
) -> HookResult<Vec<BenchmarkResult>> {
    let mut results = Vec::with_capacity(methods.len() * targets.len());
    for &method in methods {
        for &target in targets {
            results.push(run_pair(method, target, config).await?);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbench_core::Strategy;

    fn tiny() -> SuiteConfig {
        SuiteConfig {
            warmup: 1,
            iterations: 2,
            scale_down: 1_000_000,
            keep_samples: false,
            ..SuiteConfig::default()
        }
    }

    #[test]
    fn test_calls_for_scales_down() {
        let config = SuiteConfig {
            scale_down: 100,
            ..SuiteConfig::default()
        };
        assert_eq!(config.calls_for(Target::ComputeSum), 100_000);
        assert_eq!(config.calls_for(Target::Factorial), 1_000);
        assert_eq!(config.calls_for(Target::ProcessArray), 100);

        // Never below one call
        assert_eq!(tiny().calls_for(Target::ProcessArray), 1);
    }

    #[tokio::test]
    async fn test_baseline_has_no_probe_metadata() {
        let result = run_pair(Method::Baseline, Target::ComputeSum, &tiny())
            .await
            .unwrap();
        assert_eq!(result.function, "compute_sum");
        assert_eq!(result.iterations, 2);
        assert!(result.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_probed_pair_counts_its_own_calls() {
        let config = tiny();
        let calls = config.calls_for(Target::ComputeSum);
        let result = run_pair(Method::Probed(Strategy::Both), Target::ComputeSum, &config)
            .await
            .unwrap();

        // Warmup batch plus measured batches
        let expected = calls * (config.warmup + config.iterations);
        assert_eq!(result.metadata["probes"]["enters"], expected);
        assert_eq!(result.metadata["probes"]["rewrites"], expected);
    }

    #[tokio::test]
    async fn test_suite_covers_every_pair() {
        let methods = [Method::Baseline, Method::Probed(Strategy::NativeNoop)];
        let targets = [Target::Factorial, Target::TestIntercept];
        let results = run_suite(&methods, &targets, &tiny()).await.unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].method, Method::Baseline);
        assert_eq!(results[3].function, "test_intercept");
    }
}
