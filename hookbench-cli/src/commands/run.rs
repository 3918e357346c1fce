// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookbench run` command - Install probes and run the workload.
//!
//! Runs the fixed phases (hot path, recursion, array, memory, complex)
//! through the installed harness and reports wall time per phase.

use std::hint::black_box;
use std::time::Instant;

use serde::Serialize;

use hookbench_core::{HarnessStats, Strategy, TargetCaller, WorkloadConfig};

use super::ConfigSource;
use crate::cpu_affinity::CpuTopology;
use crate::metrics;

const ARRAY_LEN: usize = 1000;
const FACTORIAL_N: i32 = 20;
const ALLOCATION_SIZE: usize = 1024;

#[derive(Debug, Clone, Serialize)]
struct PhaseTiming {
    phase: &'static str,
    calls: u64,
    elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
struct RunReport {
    strategy: Strategy,
    intercepted_string: String,
    phases: Vec<PhaseTiming>,
    stats: HarnessStats,
}

pub async fn execute(
    source: &ConfigSource<'_>,
    strategy: Option<Strategy>,
    metrics_port: Option<u16>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = source.load(strategy)?;
    tracing::info!(
        strategy = %config.harness.strategy,
        targets = config.targets.len(),
        "Starting run"
    );

    if let Some(port) = metrics_port {
        metrics::start_metrics_server(port);
    }

    if let Some(cpu) = config.harness.pin_cpu {
        CpuTopology::detect().pin_current_thread(cpu)?;
    }

    let (interceptor, harness) = super::install_harness(&config).await?;
    let caller = TargetCaller::new(&interceptor);

    let intercepted_string = caller
        .test_intercept()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_string());

    let phases = run_phases(&caller, &config.workload);
    let stats = harness.stats();

    let strategy_name = stats.strategy.as_str();
    for timing in &phases {
        metrics::observe_phase(strategy_name, timing.phase, timing.calls, timing.elapsed_ms / 1000.0);
    }
    metrics::publish_stats(&stats);

    let report = RunReport {
        strategy: stats.strategy,
        intercepted_string,
        phases,
        stats,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if metrics_port.is_some() {
        println!();
        println!("Serving metrics. Press Ctrl+C to stop...");
        tokio::signal::ctrl_c().await?;
    }

    let detached = harness.uninstall();
    tracing::info!(detached = detached, "Probes removed");

    Ok(())
}

fn run_phases(caller: &TargetCaller<'_>, workload: &WorkloadConfig) -> Vec<PhaseTiming> {
    let mut phases = Vec::with_capacity(5);

    phases.push(timed("hot", workload.hot_iterations, |i| {
        let i = i as i32;
        black_box(caller.compute_sum(i, i.wrapping_add(1)));
    }));

    phases.push(timed("recursive", workload.recursive_iterations, |_| {
        black_box(caller.factorial(black_box(FACTORIAL_N)));
    }));

    let values: Vec<i32> = (0..ARRAY_LEN as i32).collect();
    let mut sum = 0;
    phases.push(timed("array", workload.array_iterations, |_| {
        black_box(caller.process_array(&values, &mut sum));
    }));

    phases.push(timed("memory", workload.memory_iterations, |_| {
        black_box(caller.allocate_and_free(ALLOCATION_SIZE));
    }));

    phases.push(timed("complex", workload.complex_iterations, |i| {
        let i = i as i32;
        black_box(caller.compute_sum_complex(i, i.wrapping_add(1)));
    }));

    phases
}

fn timed(phase: &'static str, calls: u64, mut body: impl FnMut(u64)) -> PhaseTiming {
    let start = Instant::now();
    for i in 0..calls {
        body(i);
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::debug!(phase = phase, calls = calls, elapsed_ms = elapsed_ms, "Phase complete");

    PhaseTiming {
        phase,
        calls,
        elapsed_ms,
    }
}

fn print_report(report: &RunReport) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                       HOOKBENCH RUN                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Strategy:       {}", report.strategy);
    println!("Hooked:         {} target(s)", report.stats.hooked);
    println!("Test intercept: {}", report.intercepted_string);
    println!();
    for timing in &report.phases {
        println!(
            "  {:<10} {:>10} calls {:>12.3} ms",
            timing.phase, timing.calls, timing.elapsed_ms
        );
    }
    println!();
    println!(
        "Probes: {} enters, {} leaves, {} rewrites, {} workload runs",
        report.stats.probes.enters,
        report.stats.probes.leaves,
        report.stats.probes.rewrites,
        report.stats.probes.workload_runs
    );
}
