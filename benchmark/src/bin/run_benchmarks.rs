// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run the overhead suite and generate reports.

use anyhow::Context;
use clap::Parser;
use hookbench_benchmark::{
    run_pair, BenchmarkReport, JsonReporter, LatencyMetrics, Method, SuiteConfig, Summary,
};
use hookbench_core::{ConfigLoader, Target, WorkloadConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "run_benchmarks")]
#[command(about = "Time every target under every probe strategy and write JSON reports")]
struct Args {
    /// Output directory for benchmark data
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Samples per function × method
    #[arg(short, long, default_value_t = 5)]
    iterations: u64,

    /// Take call counts from this config's workload section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Methods to run: baseline or a strategy name (all if not specified)
    #[arg(short, long)]
    method: Option<Vec<String>>,

    /// Target functions to run (all if not specified)
    #[arg(short, long)]
    function: Option<Vec<String>>,

    /// Also write one report file per function
    #[arg(long)]
    split: bool,

    /// Run in quick mode (call counts divided by 100)
    #[arg(long)]
    quick: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let workload = match &args.config {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("loading {}", path.display()))?
            .workload,
        None => WorkloadConfig::default(),
    };

    let methods: Vec<Method> = match &args.method {
        Some(names) => names
            .iter()
            .map(|n| n.parse::<Method>().map_err(anyhow::Error::msg))
            .collect::<anyhow::Result<_>>()?,
        None => Method::all(),
    };

    let targets: Vec<Target> = match &args.function {
        Some(names) => names
            .iter()
            .map(|n| Target::from_name(n).with_context(|| format!("unknown function '{}'", n)))
            .collect::<anyhow::Result<_>>()?,
        None => Target::ALL.to_vec(),
    };

    let config = SuiteConfig {
        iterations: args.iterations,
        workload,
        scale_down: if args.quick { 100 } else { 1 },
        ..SuiteConfig::default()
    };

    println!("Hookbench Benchmark Suite");
    println!("=========================");
    println!("Output directory: {:?}", args.output);
    println!("Samples: {}", config.iterations);
    println!();

    let reporter = JsonReporter::new(&args.output)?;
    let mut report = BenchmarkReport::new();

    for &method in &methods {
        println!("Running {} ...", method);
        for &target in &targets {
            let started = Instant::now();
            let result = run_pair(method, target, &config).await?;
            let elapsed = started.elapsed();
            println!(
                "  ✓ {:<20} {:>12}/call  ({} calls/sample, wall {:.2?})",
                target.name(),
                LatencyMetrics::format_latency(result.per_call_ns() as u64),
                result.calls_per_sample,
                elapsed
            );
            report.add_result(result);
        }
    }

    // Save report
    let path = reporter.save(&report)?;
    println!();
    println!("Benchmark report saved to: {:?}", path);
    if args.split {
        for path in reporter.save_by_function(&report)? {
            println!("  {:?}", path);
        }
    }
    println!();

    print!("{}", Summary::from_report(&report).render());

    Ok(())
}
