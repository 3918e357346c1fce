// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Print mean ± std per function × method from saved reports.

use anyhow::Context;
use clap::Parser;
use hookbench_benchmark::{JsonReporter, Summary};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "summarize")]
#[command(about = "Pool saved benchmark reports into a summary table")]
struct Args {
    /// Report files to pool (every report in --dir if not specified)
    files: Vec<PathBuf>,

    /// Directory holding saved reports
    #[arg(short, long, default_value = "data")]
    dir: PathBuf,

    /// Print rows as JSON lines instead of the table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let files = if args.files.is_empty() {
        JsonReporter::new(&args.dir)?.list_reports()?
    } else {
        args.files
    };
    anyhow::ensure!(!files.is_empty(), "no reports found");

    let reports = files
        .iter()
        .map(|path| JsonReporter::load(path).with_context(|| format!("loading {}", path.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let summary = Summary::from_reports(&reports);

    if args.json {
        for row in summary.rows() {
            println!(
                "{}",
                serde_json::json!({
                    "function": row.function,
                    "method": row.method,
                    "samples": row.samples,
                    "mean_ms": row.mean_ms,
                    "std_ms": row.std_ms,
                    "overhead_pct": row.overhead_pct,
                })
            );
        }
    } else {
        println!("Pooled {} report(s)", reports.len());
        println!();
        print!("{}", summary.render());
    }

    Ok(())
}
