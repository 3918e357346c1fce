// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness for running and timing operations.
//!
//! Provides utilities for measuring execution time with high precision
//! and collecting samples for statistical analysis.

use std::time::Instant;

/// A benchmark harness for measuring operation latency.
pub struct BenchmarkHarness {
    /// Number of warmup iterations before measurement
    warmup_iterations: u64,
    /// Number of measurement iterations
    measurement_iterations: u64,
    /// Whether to keep raw sample data
    keep_raw_samples: bool,
}

impl BenchmarkHarness {
    /// Create a new benchmark harness with default settings.
    pub fn new() -> Self {
        Self {
            warmup_iterations: 1,
            measurement_iterations: 5,
            keep_raw_samples: true,
        }
    }

    /// Set the number of warmup iterations.
    pub fn warmup(mut self, iterations: u64) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    /// Set the number of measurement iterations.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.measurement_iterations = iterations;
        self
    }

    /// Set whether to keep raw sample data.
    pub fn keep_samples(mut self, keep: bool) -> Self {
        self.keep_raw_samples = keep;
        self
    }

    /// Run a benchmark and collect latency samples.
    ///
    /// The closure should perform a single iteration of the operation being measured.
    /// Returns a vector of latency samples in nanoseconds.
    pub fn run<F>(&self, mut operation: F) -> Vec<u64>
    where
        F: FnMut(),
    {
        // Warmup phase
        for _ in 0..self.warmup_iterations {
            operation();
        }

        // Measurement phase
        let mut samples = Vec::with_capacity(self.measurement_iterations as usize);
        for _ in 0..self.measurement_iterations {
            let start = Instant::now();
            operation();
            let elapsed = start.elapsed();
            samples.push(elapsed.as_nanos() as u64);
        }

        samples
    }

    /// Run `calls` back-to-back invocations per sample.
    ///
    /// The closure receives the call index within the batch. One sample is
    /// the wall time of the whole batch, which keeps timer overhead out of
    /// nanosecond-scale calls.
    pub fn run_batched<F>(&self, calls: u64, mut call: F) -> Vec<u64>
    where
        F: FnMut(u64),
    {
        self.run(|| {
            for i in 0..calls {
                call(i);
            }
        })
    }

    /// Check if raw samples should be kept.
    pub fn should_keep_samples(&self) -> bool {
        self.keep_raw_samples
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_harness_basic() {
        let harness = BenchmarkHarness::new().warmup(5).iterations(20);

        let samples = harness.run(|| {
            thread::sleep(Duration::from_micros(100));
        });

        assert_eq!(samples.len(), 20);
        // Each sample should be at least 100μs
        for sample in &samples {
            assert!(*sample >= 100_000, "Sample {} < 100μs", sample);
        }
    }

    #[test]
    fn test_harness_batched_counts_calls() {
        let harness = BenchmarkHarness::new().warmup(2).iterations(3);
        let mut seen = Vec::new();

        let samples = harness.run_batched(4, |i| seen.push(i));

        assert_eq!(samples.len(), 3);
        // Warmup and measurement batches all run
        assert_eq!(seen.len(), 5 * 4);
        assert_eq!(&seen[..4], &[0, 1, 2, 3]);
    }
}
