// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end integration tests for hookbench.
//!
//! These tests verify the complete flow from configuration to probes running
//! around the built-in targets.

use std::sync::Arc;
use std::thread;

use hookbench_core::workload::{CacheOutcome, Workload};
use hookbench_core::{
    ConfigLoader, InProcessInterceptor, ManagedEngine, NativeEngine, ProbeHarness, Strategy,
    TargetCaller, TargetLibrary,
};
use tempfile::TempDir;

/// Test configuration loading and validation from a file
#[test]
fn test_config_loading_and_validation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("hookbench.yaml");

    std::fs::write(
        &config_path,
        r#"
harness:
  module: libfuncs.so
  strategy: onleave
  retry_delay_ms: 5

targets:
  - name: compute_sum
  - name: test_intercept
  - name: factorial
    returns: int

workload:
  hot_iterations: 500
"#,
    )
    .expect("Failed to write config");

    let config = ConfigLoader::load_file(&config_path).expect("Failed to load config");

    assert_eq!(config.targets.len(), 3);
    assert_eq!(config.harness.strategy, Strategy::OnLeave);
    assert_eq!(config.harness.string_marker, "HOOKBENCH_ONLEAVE");
    assert_eq!(config.workload.hot_iterations, 500);
}

/// Test invalid configuration is rejected
#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("bad.yaml");

    std::fs::write(
        &config_path,
        r#"
harness:
  retry_delay_ms: 0
targets:
  - name: compute_sum
"#,
    )
    .expect("Failed to write config");

    assert!(ConfigLoader::load_file(&config_path).is_err());
}

/// Test a config-driven harness rewrites the configured targets only
#[tokio::test]
async fn test_config_driven_harness() {
    let config = ConfigLoader::load_string(
        r#"
harness:
  strategy: both
  sentinel: 1234
  string_marker: PATCHED
targets:
  - name: compute_sum
  - name: test_intercept
"#,
    )
    .expect("Failed to load config");

    let interceptor = Arc::new(InProcessInterceptor::new());
    let harness = ProbeHarness::new(
        config.harness,
        config.targets,
        Arc::new(TargetLibrary::resolver()),
        interceptor.clone(),
        None,
    )
    .expect("Failed to build harness");

    let report = harness.install().await;
    assert_eq!(report.hooked_count(), 2);

    let caller = TargetCaller::new(&interceptor);
    assert_eq!(caller.compute_sum(1, 1), 1234);
    assert_eq!(caller.compute_sum_heavy(1, 1), 2);
    assert_eq!(caller.test_intercept().unwrap().to_bytes(), b"PATCHED");
}

/// Test the engine end to end: repeat inputs hit the cache
#[test]
fn test_engine_repeat_inputs() {
    let engine = ManagedEngine::managed();
    let first = engine.run(3, 4);
    let second = engine.run(3, 4);

    assert_eq!(first.outcome, CacheOutcome::Miss);
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(first.fib_index, second.fib_index);
    assert_eq!(first.is_prime, second.is_prime);
    assert_eq!(first.matrix, second.matrix);
}

/// Test concurrent probe calls against one shared engine
#[tokio::test]
async fn test_concurrent_complex_probes() {
    let interceptor = Arc::new(InProcessInterceptor::new());
    let harness = ProbeHarness::new(
        hookbench_core::HarnessConfig::for_strategy(Strategy::Complex),
        vec![hookbench_core::Target::ComputeSumComplex.into()],
        Arc::new(TargetLibrary::resolver()),
        interceptor.clone(),
        None,
    )
    .expect("Failed to build harness");
    harness.install().await;

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let interceptor = Arc::clone(&interceptor);
            thread::spawn(move || {
                let caller = TargetCaller::new(&interceptor);
                for i in 0..100 {
                    caller.compute_sum_complex(t, i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Worker panicked");
    }

    let stats = harness.stats();
    assert_eq!(stats.probes.workload_runs, 800);
    assert_eq!(stats.workload.calls, 800);
    assert_eq!(stats.workload.cache.lookups(), 800);
    assert_eq!(stats.workload.sample_count, 800);
}

/// Test both engine flavours agree on everything but the cache policy
#[test]
fn test_engine_flavours_equivalent() {
    let managed = ManagedEngine::managed();
    let native = NativeEngine::native();

    for i in -50..50 {
        let m = managed.run(i, i * 3);
        let n = native.run(i, i * 3);
        assert_eq!(m.fib_value, n.fib_value);
        assert_eq!(m.is_prime, n.is_prime);
        assert_eq!(m.matrix, n.matrix);
        assert_eq!(m.analysis, n.analysis);
    }
}
