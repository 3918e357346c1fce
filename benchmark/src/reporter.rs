// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON report generation for benchmark results.
//!
//! Handles saving benchmark data to timestamped JSON files for later visualization.

use crate::metrics::BenchmarkReport;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to access report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON reporter for benchmark results.
pub struct JsonReporter {
    /// Output directory for benchmark data
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Create a reporter using the default data directory.
    pub fn default_location() -> Result<Self, ReporterError> {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        let data_dir = Path::new(manifest_dir).join("data");
        Self::new(data_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save a benchmark report to a JSON file.
    ///
    /// Returns the path to the created file.
    pub fn save(&self, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        self.write("hookbench", report)
    }

    /// Save one report per target function, sharing the run id and timestamp.
    pub fn save_by_function(
        &self,
        report: &BenchmarkReport,
    ) -> Result<Vec<PathBuf>, ReporterError> {
        let mut by_function: HashMap<&str, Vec<_>> = HashMap::new();
        for result in &report.results {
            by_function
                .entry(result.function.as_str())
                .or_default()
                .push(result.clone());
        }

        let mut paths = Vec::new();
        for (function, results) in by_function {
            let mut function_report = report.clone();
            function_report.results = results;
            paths.push(self.write(function, &function_report)?);
        }

        paths.sort();
        Ok(paths)
    }

    /// List all existing benchmark files in the output directory.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load an existing benchmark report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReporterError> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(file)?;
        Ok(report)
    }

    fn write(&self, prefix: &str, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        let timestamp = report.timestamp.format("%Y-%m-%dT%H-%M-%SZ");
        let short_id = report.run_id.simple().to_string();
        let filename = format!("{}_{}_{}.json", prefix, timestamp, &short_id[..8]);
        let filepath = self.output_dir.join(&filename);

        let file = File::create(&filepath)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report)?;

        Ok(filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BenchmarkResult, Method};
    use tempfile::TempDir;

    fn sample_report() -> BenchmarkReport {
        let mut report = BenchmarkReport::new();
        for function in ["compute_sum", "factorial"] {
            report.add_result(BenchmarkResult::new(
                function,
                Method::Baseline,
                vec![100, 200, 300],
                1,
                false,
            ));
        }
        report
    }

    #[test]
    fn test_reporter_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let report = sample_report();
        let path = reporter.save(&report).unwrap();
        assert!(path.exists());

        let loaded = JsonReporter::load(&path).unwrap();
        assert_eq!(loaded.results.len(), 2);
        assert_eq!(loaded.results[0].function, "compute_sum");
        assert_eq!(loaded.results[0].method, Method::Baseline);
        assert_eq!(loaded.run_id, report.run_id);
    }

    #[test]
    fn test_save_by_function() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let report = sample_report();
        let paths = reporter.save_by_function(&report).unwrap();
        assert_eq!(paths.len(), 2);

        for path in &paths {
            let loaded = JsonReporter::load(path).unwrap();
            assert_eq!(loaded.results.len(), 1);
            assert_eq!(loaded.run_id, report.run_id);
        }
        assert_eq!(reporter.list_reports().unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            JsonReporter::load("/nonexistent/hookbench.json"),
            Err(ReporterError::Io(_))
        ));
    }
}
