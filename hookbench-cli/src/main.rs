// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Hookbench CLI
//!
//! Command-line interface for the hookbench instrumentation benchmark.

use clap::{Parser, Subcommand};
use hookbench_core::Strategy;

mod commands;
mod cpu_affinity;
mod metrics;

/// Hookbench - overhead benchmark for function entry/exit probes
#[derive(Parser)]
#[command(name = "hookbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "hookbench.yaml")]
    pub config: String,

    /// Ignore the configuration file and probe every built-in target
    #[arg(long)]
    pub builtin: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install probes and run the workload phases against the targets
    Run {
        /// Override the configured strategy (also resets the string marker)
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Serve Prometheus metrics on this port and wait for Ctrl+C
        #[arg(long)]
        metrics_port: Option<u16>,

        /// Print phase timings and stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured targets and where they resolve
    List {
        /// Also list every module loaded in this process
        #[arg(long)]
        loaded: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// Drive the complex target and print a harness stats snapshot
    Stats {
        /// Number of calls to make before taking the snapshot
        #[arg(short = 'n', long, default_value_t = 1000)]
        calls: u32,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let source = commands::ConfigSource::new(&cli.config, cli.builtin);

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            strategy,
            metrics_port,
            json,
        } => commands::run::execute(&source, strategy, metrics_port, json).await,
        Commands::List { loaded } => commands::list::execute(&source, loaded).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Stats { calls, json } => commands::stats::execute(&source, calls, json).await,
    }
}
