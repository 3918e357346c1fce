// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Running statistics over a sliding sample window.
//!
//! ```text
//!   samples: [i64; N]   cursor: next write index
//!   len: number of valid samples (<= N)
//!
//!   observe(v): samples[cursor] = v, cursor = (cursor + 1) % N
//!   oldest sample sits at (cursor + N - len) % N
//! ```
//!
//! Lifetime totals (sum/count/min/max) never forget anything. Mean and
//! variance are recomputed from the window contents on every observation,
//! O(N) per call.

use serde::{Deserialize, Serialize};

/// Window capacity used by both engine flavours.
pub const WINDOW_CAPACITY: usize = 1000;

/// Fixed-capacity ring of the most recent samples, in insertion order.
#[derive(Debug, Clone)]
pub struct SampleWindow<const N: usize = WINDOW_CAPACITY> {
    samples: Box<[i64; N]>,
    len: usize,
    cursor: usize,
}

impl<const N: usize> SampleWindow<N> {
    pub fn new() -> Self {
        assert!(N > 0, "sample window needs a non-zero capacity");
        Self {
            samples: Box::new([0; N]),
            len: 0,
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append to the tail, dropping the head once full.
    pub fn push(&mut self, value: i64) {
        self.samples[self.cursor] = value;
        self.cursor = (self.cursor + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        let start = (self.cursor + N - self.len) % N;
        (0..self.len).map(move |i| self.samples[(start + i) % N])
    }

    pub fn oldest(&self) -> Option<i64> {
        self.iter().next()
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

/// Lifetime totals plus the sample window.
#[derive(Debug, Clone)]
pub struct RunningStatistics<const N: usize = WINDOW_CAPACITY> {
    window: SampleWindow<N>,
    sum: i64,
    count: u64,
    min: i64,
    max: i64,
}

impl<const N: usize> RunningStatistics<N> {
    pub fn new() -> Self {
        Self {
            window: SampleWindow::new(),
            sum: 0,
            count: 0,
            min: i64::MAX,
            max: i64::MIN,
        }
    }

    /// Record one value and recompute mean/variance over the current window.
    ///
    /// Variance is the population variance (divides by the window length).
    pub fn observe(&mut self, value: i64) -> Analysis {
        self.window.push(value);
        self.sum = self.sum.wrapping_add(value);
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        // The window holds at least the value just pushed.
        let len = self.window.len() as f64;
        let mean = self.window.iter().map(|v| v as f64).sum::<f64>() / len;
        let variance = self
            .window
            .iter()
            .map(|v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / len;

        Analysis {
            mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }

    /// `sum / count` over every observation ever made.
    pub fn lifetime_mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    /// `None` until the first observation.
    pub fn min(&self) -> Option<i64> {
        (self.count > 0).then_some(self.min)
    }

    /// `None` until the first observation.
    pub fn max(&self) -> Option<i64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn window(&self) -> &SampleWindow<N> {
        &self.window
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl<const N: usize> Default for RunningStatistics<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(values: &[i64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<i64>() as f64 / n;
        let var = values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, var)
    }

    #[test]
    fn test_window_slides() {
        let mut window: SampleWindow<3> = SampleWindow::new();
        for v in 1..=5 {
            window.push(v);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(window.oldest(), Some(3));
    }

    #[test]
    fn test_observe_matches_direct_recomputation() {
        let values = [4, -2, 17, 0, 9, 9, -30, 12];
        let mut stats: RunningStatistics = RunningStatistics::new();
        let mut last = Analysis::default();
        for &v in &values {
            last = stats.observe(v);
        }

        let (mean, var) = direct(&values);
        assert!((last.mean - mean).abs() < 1e-9);
        assert!((last.variance - var).abs() < 1e-9);
        assert!((last.std_dev - var.sqrt()).abs() < 1e-9);
        assert_eq!(stats.min(), Some(-30));
        assert_eq!(stats.max(), Some(17));
        assert_eq!(stats.count(), values.len() as u64);
    }

    #[test]
    fn test_mean_uses_last_window_only() {
        let mut stats: RunningStatistics<4> = RunningStatistics::new();
        let values: Vec<i64> = (1..=10).collect();
        let mut last = Analysis::default();
        for &v in &values {
            last = stats.observe(v);
        }

        let (mean, var) = direct(&values[6..]);
        assert!((last.mean - mean).abs() < 1e-9);
        assert!((last.variance - var).abs() < 1e-9);
        assert_eq!(stats.lifetime_mean(), Some(5.5));
    }

    #[test]
    fn test_oldest_observation_stops_influencing_variance() {
        let mut with_outlier: RunningStatistics = RunningStatistics::new();
        let mut without_outlier: RunningStatistics = RunningStatistics::new();

        with_outlier.observe(1_000_000);
        without_outlier.observe(7);

        let mut a = Analysis::default();
        let mut b = Analysis::default();
        for i in 0..WINDOW_CAPACITY as i64 {
            a = with_outlier.observe(i % 13);
            b = without_outlier.observe(i % 13);
        }

        assert_eq!(a, b);
        assert_eq!(with_outlier.max(), Some(1_000_000));
    }

    #[test]
    fn test_single_observation() {
        let mut stats: RunningStatistics = RunningStatistics::new();
        let analysis = stats.observe(42);
        assert_eq!(analysis.mean, 42.0);
        assert_eq!(analysis.variance, 0.0);
        assert_eq!(stats.min(), Some(42));
    }

    #[test]
    fn test_empty_statistics() {
        let stats: RunningStatistics = RunningStatistics::new();
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
        assert_eq!(stats.lifetime_mean(), None);
        assert!(stats.window().is_empty());
    }
}
