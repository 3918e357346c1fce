// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Standardized metrics types for benchmark results.
//!
//! Every result is tagged with the target function it timed and the method
//! it ran under: `baseline` (no probes) or one of the probe strategies.

use chrono::{DateTime, Utc};
use hookbench_core::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sysinfo::System;
use uuid::Uuid;

/// How a target was run while being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Method {
    /// Direct calls, nothing attached
    Baseline,
    /// Calls routed through an installed probe harness
    Probed(Strategy),
}

impl Method {
    /// Baseline followed by every strategy.
    pub fn all() -> Vec<Method> {
        std::iter::once(Method::Baseline)
            .chain(Strategy::ALL.into_iter().map(Method::Probed))
            .collect()
    }

    /// Position in report listings, baseline first.
    pub fn rank(&self) -> usize {
        match self {
            Method::Baseline => 0,
            Method::Probed(strategy) => {
                1 + Strategy::ALL
                    .iter()
                    .position(|s| s == strategy)
                    .unwrap_or(Strategy::ALL.len())
            }
        }
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Method::Baseline => None,
            Method::Probed(strategy) => Some(*strategy),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Baseline => write!(f, "baseline"),
            Method::Probed(strategy) => write!(f, "{}", strategy),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("baseline") {
            return Ok(Method::Baseline);
        }
        s.parse::<Strategy>()
            .map(Method::Probed)
            .map_err(|e| e.to_string())
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.to_string()
    }
}

impl TryFrom<String> for Method {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Latency metrics with statistical analysis.
///
/// Follows research-level benchmarking methodology with percentile distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Minimum observed latency in nanoseconds
    pub min_ns: u64,
    /// Maximum observed latency in nanoseconds
    pub max_ns: u64,
    /// Arithmetic mean latency in nanoseconds
    pub mean_ns: f64,
    /// Median (p50) latency in nanoseconds
    pub median_ns: u64,
    /// 95th percentile latency in nanoseconds
    pub p95_ns: u64,
    /// 99th percentile latency in nanoseconds
    pub p99_ns: u64,
    /// Standard deviation in nanoseconds
    pub std_dev_ns: f64,
    /// Raw sample data for visualization (optional, may be truncated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<u64>>,
}

impl LatencyMetrics {
    /// Calculate metrics from a vector of latency samples (in nanoseconds).
    pub fn from_samples(mut samples: Vec<u64>, keep_raw: bool) -> Self {
        if samples.is_empty() {
            return Self {
                min_ns: 0,
                max_ns: 0,
                mean_ns: 0.0,
                median_ns: 0,
                p95_ns: 0,
                p99_ns: 0,
                std_dev_ns: 0.0,
                samples: None,
            };
        }

        samples.sort_unstable();
        let len = samples.len();

        let min_ns = samples[0];
        let max_ns = samples[len - 1];
        let sum: u64 = samples.iter().sum();
        let mean_ns = sum as f64 / len as f64;
        let median_ns = samples[len / 2];
        let p95_ns = samples[(len as f64 * 0.95) as usize];
        let p99_ns = samples[(len as f64 * 0.99) as usize];

        // Population standard deviation
        let variance: f64 = samples
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean_ns;
                diff * diff
            })
            .sum::<f64>()
            / len as f64;
        let std_dev_ns = variance.sqrt();

        // Optionally keep raw samples (truncate if too large for visualization)
        let raw_samples = if keep_raw {
            if len > 10000 {
                // Downsample for storage efficiency
                Some(samples.iter().step_by(len / 1000).copied().collect())
            } else {
                Some(samples)
            }
        } else {
            None
        };

        Self {
            min_ns,
            max_ns,
            mean_ns,
            median_ns,
            p95_ns,
            p99_ns,
            std_dev_ns,
            samples: raw_samples,
        }
    }

    pub fn mean_ms(&self) -> f64 {
        self.mean_ns / 1_000_000.0
    }

    pub fn std_dev_ms(&self) -> f64 {
        self.std_dev_ns / 1_000_000.0
    }

    /// Format latency in human-readable form (auto-selects ns/μs/ms).
    pub fn format_latency(ns: u64) -> String {
        if ns < 1_000 {
            format!("{}ns", ns)
        } else if ns < 1_000_000 {
            format!("{:.2}μs", ns as f64 / 1_000.0)
        } else if ns < 1_000_000_000 {
            format!("{:.2}ms", ns as f64 / 1_000_000.0)
        } else {
            format!("{:.2}s", ns as f64 / 1_000_000_000.0)
        }
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Timing of one target function under one method.
///
/// Each sample is the wall time of `calls_per_sample` back-to-back calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Target function name
    pub function: String,
    /// Method the function ran under
    pub method: Method,
    /// Latency metrics over the samples
    pub latency: LatencyMetrics,
    /// Calls timed together as one sample
    pub calls_per_sample: u64,
    /// Number of samples
    pub iterations: u64,
    /// Additional metadata specific to this benchmark
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Create a result from batch samples (in nanoseconds).
    pub fn new(
        function: impl Into<String>,
        method: Method,
        samples: Vec<u64>,
        calls_per_sample: u64,
        keep_raw_samples: bool,
    ) -> Self {
        let iterations = samples.len() as u64;
        Self {
            function: function.into(),
            method,
            latency: LatencyMetrics::from_samples(samples, keep_raw_samples),
            calls_per_sample,
            iterations,
            metadata: HashMap::new(),
        }
    }

    /// Mean cost of a single call in nanoseconds.
    pub fn per_call_ns(&self) -> f64 {
        if self.calls_per_sample == 0 {
            return 0.0;
        }
        self.latency.mean_ns / self.calls_per_sample as f64
    }

    /// Add metadata to the result. Values that fail to serialize are skipped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), value);
        }
        self
    }
}

/// Complete benchmark suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Identifies one invocation across split report files
    pub run_id: Uuid,
    /// Timestamp when benchmarks were run
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    /// Individual benchmark results
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    /// Create a new benchmark report.
    pub fn new() -> Self {
        Self {
            benchmark_suite: "hookbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            results: Vec::new(),
        }
    }

    /// Add a result to the report.
    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    /// Distinct function names, in first-seen order.
    pub fn functions(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for result in &self.results {
            if !seen.contains(&result.function.as_str()) {
                seen.push(result.function.as_str());
            }
        }
        seen
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_metrics_from_samples() {
        let samples = vec![100, 200, 300, 400, 500, 600, 700, 800, 900, 1000];
        let metrics = LatencyMetrics::from_samples(samples, false);

        assert_eq!(metrics.min_ns, 100);
        assert_eq!(metrics.max_ns, 1000);
        assert_eq!(metrics.median_ns, 600);
        assert!((metrics.mean_ns - 550.0).abs() < 0.01);
        assert!(metrics.samples.is_none());
    }

    #[test]
    fn test_latency_metrics_std_dev() {
        let metrics = LatencyMetrics::from_samples(vec![2, 4, 4, 4, 5, 5, 7, 9], false);
        assert!((metrics.mean_ns - 5.0).abs() < 1e-9);
        assert!((metrics.std_dev_ns - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_latency_format() {
        assert_eq!(LatencyMetrics::format_latency(500), "500ns");
        assert_eq!(LatencyMetrics::format_latency(1500), "1.50μs");
        assert_eq!(LatencyMetrics::format_latency(1_500_000), "1.50ms");
        assert_eq!(LatencyMetrics::format_latency(1_500_000_000), "1.50s");
    }

    #[test]
    fn test_method_round_trip_names() {
        assert_eq!("baseline".parse::<Method>(), Ok(Method::Baseline));
        assert_eq!(
            "complex_native".parse::<Method>(),
            Ok(Method::Probed(Strategy::ComplexNative))
        );
        assert!("frida".parse::<Method>().is_err());
        assert_eq!(Method::Probed(Strategy::OnEnter).to_string(), "onenter");
    }

    #[test]
    fn test_method_ordering() {
        let methods = Method::all();
        assert_eq!(methods[0], Method::Baseline);
        assert_eq!(methods.len(), Strategy::ALL.len() + 1);
        for (i, method) in methods.iter().enumerate() {
            assert_eq!(method.rank(), i);
        }
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_benchmark_result_serialization() {
        let result = BenchmarkResult::new(
            "compute_sum",
            Method::Probed(Strategy::Both),
            vec![100, 200, 300],
            10,
            false,
        )
        .with_metadata("rewrites", 30);

        assert!((result.per_call_ns() - 20.0).abs() < 1e-9);

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("compute_sum"));
        assert!(json.contains("\"method\": \"both\""));
        assert!(json.contains("rewrites"));
    }

    #[test]
    fn test_report_functions_in_order() {
        let mut report = BenchmarkReport::new();
        for function in ["factorial", "compute_sum", "factorial"] {
            report.add_result(BenchmarkResult::new(
                function,
                Method::Baseline,
                vec![1],
                1,
                false,
            ));
        }
        assert_eq!(report.functions(), vec!["factorial", "compute_sum"]);
    }
}
