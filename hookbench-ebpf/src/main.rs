// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Standalone uprobe counter.
//!
//! Attaches entry and return probes to each symbol and prints the raw
//! per-address counts every second until interrupted.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use hookbench_core::{HookResult, ProcessId, SymbolName};
use hookbench_ebpf::{ProbeKind, UprobeManager};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Count entries and returns of functions in a binary with kernel uprobes.
///
/// Requires root privileges and an eBPF-capable kernel.
#[derive(Parser, Debug)]
#[command(name = "hookbench-ebpf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Compiled BPF object exporting the entry and return programs
    object: PathBuf,

    /// Binary or shared library the symbols live in
    target: PathBuf,

    /// Symbols to probe
    #[arg(required = true)]
    symbols: Vec<String>,

    /// Only count calls made by this process
    #[arg(short, long)]
    pid: Option<u32>,

    /// Seconds between count dumps
    #[arg(long, default_value_t = 1)]
    interval: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "Uprobe counter failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> HookResult<()> {
    let pid = args.pid.map(ProcessId::new).transpose()?;
    let mut manager = UprobeManager::new(args.target, pid);
    manager.load_program(&args.object)?;

    for raw in &args.symbols {
        let symbol = SymbolName::new(raw.as_str())?;
        manager.attach(&symbol, None, ProbeKind::Entry).await?;
        manager.attach(&symbol, None, ProbeKind::Return).await?;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let entries = manager.read_hits(ProbeKind::Entry)?;
                let returns = manager.read_hits(ProbeKind::Return)?;
                for (address, count) in &entries {
                    let ret = returns.get(address).copied().unwrap_or(0);
                    println!("{:#x}\tentries={}\treturns={}", address, count, ret);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    manager.detach();
    Ok(())
}
