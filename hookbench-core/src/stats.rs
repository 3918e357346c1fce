// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

use serde::{Deserialize, Serialize};

use crate::harness::Strategy;
use crate::workload::WorkloadSnapshot;

/// Serializable view of a running harness, printed by `hookbench stats`
/// and embedded in benchmark reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessStats {
    pub strategy: Strategy,
    pub module: String,
    pub hooked: usize,
    pub probes: ProbeCounterSnapshot,
    pub workload: WorkloadSnapshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeCounterSnapshot {
    pub enters: u64,
    pub leaves: u64,
    pub rewrites: u64,
    pub workload_runs: u64,
}

impl HarnessStats {
    /// Fraction of workload cache lookups that hit, if any were made.
    pub fn cache_hit_rate(&self) -> Option<f64> {
        let lookups = self.workload.cache.lookups();
        (lookups > 0).then(|| self.workload.cache.hits as f64 / lookups as f64)
    }
}
