// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Hookbench Benchmarking Framework
//!
//! Measures what probes cost: every target function of the built-in library
//! is timed directly (`baseline`) and under each probe strategy.
//!
//! # Data Output
//!
//! Runs are written as timestamped JSON reports. The summary view gives
//! mean ± std per function × method and the overhead against baseline.

pub mod harness;
pub mod metrics;
pub mod reporter;
pub mod suite;
pub mod summary;

pub use harness::BenchmarkHarness;
pub use metrics::{BenchmarkReport, BenchmarkResult, LatencyMetrics, Method, SystemInfo};
pub use reporter::JsonReporter;
pub use suite::{run_pair, run_suite, SuiteConfig};
pub use summary::{Summary, SummaryRow};
