// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Mean ± std per function × method, with overhead against baseline.
//!
//! Results for the same pair from several reports are pooled: the combined
//! mean weights each result by its sample count and the combined variance
//! includes the spread between result means.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::metrics::{BenchmarkReport, Method};

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub function: String,
    pub method: Method,
    pub samples: u64,
    pub mean_ms: f64,
    pub std_ms: f64,
    /// Percent slower than baseline; None without a baseline row
    pub overhead_pct: Option<f64>,
}

/// Pooling accumulator: sample count, Σ n·mean, Σ n·(std² + mean²).
#[derive(Debug, Default, Clone, Copy)]
struct Pool {
    n: u64,
    weighted_mean: f64,
    weighted_square: f64,
}

impl Pool {
    fn add(&mut self, n: u64, mean: f64, std: f64) {
        let w = n as f64;
        self.n += n;
        self.weighted_mean += w * mean;
        self.weighted_square += w * (std * std + mean * mean);
    }

    fn mean(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.weighted_mean / self.n as f64
    }

    fn std(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.weighted_square / self.n as f64 - mean * mean).max(0.0).sqrt()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    rows: Vec<SummaryRow>,
}

impl Summary {
    pub fn from_report(report: &BenchmarkReport) -> Self {
        Self::from_reports(std::slice::from_ref(report))
    }

    pub fn from_reports(reports: &[BenchmarkReport]) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut pools: BTreeMap<(String, usize), (Method, Pool)> = BTreeMap::new();

        for result in reports.iter().flat_map(|r| r.results.iter()) {
            if !order.contains(&result.function) {
                order.push(result.function.clone());
            }
            let key = (result.function.clone(), result.method.rank());
            let (_, pool) = pools
                .entry(key)
                .or_insert_with(|| (result.method, Pool::default()));
            pool.add(
                result.iterations,
                result.latency.mean_ms(),
                result.latency.std_dev_ms(),
            );
        }

        let mut rows = Vec::with_capacity(pools.len());
        for function in &order {
            let baseline = pools
                .get(&(function.clone(), Method::Baseline.rank()))
                .map(|(_, pool)| pool.mean());

            let span = (function.clone(), 0)..=(function.clone(), usize::MAX);
            for (method, pool) in pools.range(span).map(|(_, entry)| entry) {
                let mean_ms = pool.mean();
                let overhead_pct = match (method, baseline) {
                    (Method::Baseline, _) => None,
                    (_, Some(base)) if base > 0.0 => Some((mean_ms - base) / base * 100.0),
                    _ => None,
                };
                rows.push(SummaryRow {
                    function: function.clone(),
                    method: *method,
                    samples: pool.n,
                    mean_ms,
                    std_ms: pool.std(),
                    overhead_pct,
                });
            }
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn row(&self, function: &str, method: Method) -> Option<&SummaryRow> {
        self.rows
            .iter()
            .find(|r| r.function == function && r.method == method)
    }

    /// Plain-text table grouped by function.
    pub fn render(&self) -> String {
        let mut out = String::from("Performance Summary (mean ± std ms):\n");
        let mut current: Option<&str> = None;

        for row in &self.rows {
            if current != Some(row.function.as_str()) {
                let _ = write!(out, "\n{}:\n", row.function.to_uppercase());
                current = Some(row.function.as_str());
            }
            let _ = write!(
                out,
                "  {:<16}: {:>10.3} ± {:>8.3}",
                row.method.to_string(),
                row.mean_ms,
                row.std_ms
            );
            if let Some(pct) = row.overhead_pct {
                let _ = write!(out, "  ({:+.1}%)", pct);
            }
            out.push('\n');
        }

        out
    }
}
