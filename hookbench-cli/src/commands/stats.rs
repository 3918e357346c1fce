// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookbench stats` command - Show harness statistics.
//!
//! Drives the complex target through an installed harness and prints the
//! resulting probe counters and workload engine snapshot.

use hookbench_core::{HarnessStats, TargetCaller};

use super::ConfigSource;

pub async fn execute(
    source: &ConfigSource<'_>,
    calls: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = source.load(None)?;
    let (interceptor, harness) = super::install_harness(&config).await?;

    drive(&TargetCaller::new(&interceptor), calls);

    let stats = harness.stats();
    harness.uninstall();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_table(&stats);
    }

    Ok(())
}

/// Arguments for the `i`th call; wraps past `i32::MAX`.
fn complex_args(i: u32) -> (i32, i32) {
    let a = i as i32;
    (a, a.wrapping_add(1))
}

fn drive(caller: &TargetCaller<'_>, calls: u32) -> u64 {
    let mut made = 0u64;
    for i in 0..calls {
        let (a, b) = complex_args(i);
        std::hint::black_box(caller.compute_sum_complex(a, b));
        made += 1;
    }
    made
}

fn print_table(stats: &HarnessStats) {
    let workload = &stats.workload;
    let hit_rate = stats
        .cache_hit_rate()
        .map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    let fmt_opt = |v: Option<String>| v.unwrap_or_else(|| "n/a".to_string());

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     HOOKBENCH STATISTICS                     ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ Strategy:        {:<43} ║", stats.strategy.to_string());
    println!("║ Module:          {:<43} ║", stats.module);
    println!("║ Hooked targets:  {:<43} ║", stats.hooked);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ Probe enters:    {:<43} ║", stats.probes.enters);
    println!("║ Probe leaves:    {:<43} ║", stats.probes.leaves);
    println!("║ Rewrites:        {:<43} ║", stats.probes.rewrites);
    println!("║ Workload runs:   {:<43} ║", stats.probes.workload_runs);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║ Engine calls:    {:<43} ║", workload.calls);
    println!(
        "║ Cache:           {:<43} ║",
        format!(
            "{}/{} entries, {} hits, {} misses ({})",
            workload.cache_size,
            workload.cache_capacity,
            workload.cache.hits,
            workload.cache.misses,
            hit_rate
        )
    );
    println!("║ Samples:         {:<43} ║", workload.sample_count);
    println!("║ Min:             {:<43} ║", fmt_opt(workload.min.map(|v| v.to_string())));
    println!("║ Max:             {:<43} ║", fmt_opt(workload.max.map(|v| v.to_string())));
    println!("║ Mean:            {:<43} ║", fmt_opt(workload.lifetime_mean.map(|v| format!("{:.3}", v))));
    println!("╚══════════════════════════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbench_core::{Config, Strategy};

    #[test]
    fn test_complex_args_wrap_past_i32_max() {
        assert_eq!(complex_args(3), (3, 4));
        assert_eq!(complex_args(i32::MAX as u32), (i32::MAX, i32::MIN));
        assert_eq!(complex_args(3_000_000_000), (-1_294_967_296, -1_294_967_295));
    }

    #[tokio::test]
    async fn test_drive_makes_every_call() {
        let config = Config::builtin(Strategy::Complex);
        let (interceptor, harness) = crate::commands::install_harness(&config).await.unwrap();

        assert_eq!(drive(&TargetCaller::new(&interceptor), 25), 25);
        assert_eq!(harness.stats().workload.calls, 50);
        harness.uninstall();
    }
}
