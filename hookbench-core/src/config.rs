// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Validates the harness, target and workload sections at load time.
//! Any invalid field results in a HardValidationError that prevents startup.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HardValidationError, HookError, HookResult};
use crate::harness::Strategy;
use crate::targets::{Target, MODULE_NAME};
use crate::types::{ReturnKind, SymbolName};

/// Bounds on the module retry delay, in milliseconds.
const MIN_RETRY_DELAY_MS: u64 = 1;
const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Longest accepted replacement string.
const MAX_MARKER_LEN: usize = 64;

/// Raw harness section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawHarnessConfig {
    #[serde(default = "default_module")]
    module: String,
    #[serde(default = "default_strategy")]
    strategy: Strategy,
    #[serde(default = "default_retry_delay_ms")]
    retry_delay_ms: u64,
    #[serde(default = "default_sentinel")]
    sentinel: i64,
    #[serde(default)]
    string_marker: Option<String>,
    #[serde(default)]
    pin_cpu: Option<usize>,
}

fn default_module() -> String {
    MODULE_NAME.to_string()
}

fn default_strategy() -> Strategy {
    Strategy::Both
}

fn default_retry_delay_ms() -> u64 {
    10
}

fn default_sentinel() -> i64 {
    0x42
}

impl Default for RawHarnessConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            strategy: default_strategy(),
            retry_delay_ms: default_retry_delay_ms(),
            sentinel: default_sentinel(),
            string_marker: None,
            pin_cpu: None,
        }
    }
}

/// Raw target entry.
#[derive(Debug, Deserialize)]
struct RawTargetConfig {
    name: String,
    #[serde(default)]
    returns: Option<ReturnKind>,
}

/// Raw workload section: iteration counts per benchmark phase.
#[derive(Debug, Deserialize)]
struct RawWorkloadConfig {
    #[serde(default = "default_hot_iterations")]
    hot_iterations: u64,
    #[serde(default = "default_recursive_iterations")]
    recursive_iterations: u64,
    #[serde(default = "default_array_iterations")]
    array_iterations: u64,
    #[serde(default = "default_memory_iterations")]
    memory_iterations: u64,
    #[serde(default = "default_complex_iterations")]
    complex_iterations: u64,
}

fn default_hot_iterations() -> u64 {
    10_000_000
}

fn default_recursive_iterations() -> u64 {
    100_000
}

fn default_array_iterations() -> u64 {
    10_000
}

fn default_memory_iterations() -> u64 {
    100_000
}

fn default_complex_iterations() -> u64 {
    100_000
}

impl Default for RawWorkloadConfig {
    fn default() -> Self {
        Self {
            hot_iterations: default_hot_iterations(),
            recursive_iterations: default_recursive_iterations(),
            array_iterations: default_array_iterations(),
            memory_iterations: default_memory_iterations(),
            complex_iterations: default_complex_iterations(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    harness: RawHarnessConfig,
    targets: Vec<RawTargetConfig>,
    #[serde(default)]
    workload: RawWorkloadConfig,
}

/// Validated harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessConfig {
    pub module: String,
    pub strategy: Strategy,
    pub retry_delay: Duration,
    pub sentinel: i64,
    pub string_marker: String,
    pub pin_cpu: Option<usize>,
}

impl HarnessConfig {
    /// Defaults for `strategy` against the built-in target library.
    pub fn for_strategy(strategy: Strategy) -> Self {
        Self {
            module: default_module(),
            strategy,
            retry_delay: Duration::from_millis(default_retry_delay_ms()),
            sentinel: default_sentinel(),
            string_marker: strategy.default_marker().to_string(),
            pin_cpu: None,
        }
    }
}

/// Validated target entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: SymbolName,
    pub returns: ReturnKind,
}

impl From<Target> for TargetConfig {
    fn from(target: Target) -> Self {
        Self {
            name: target.symbol(),
            returns: target.returns(),
        }
    }
}

/// Validated workload iteration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub hot_iterations: u64,
    pub recursive_iterations: u64,
    pub array_iterations: u64,
    pub memory_iterations: u64,
    pub complex_iterations: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        let raw = RawWorkloadConfig::default();
        Self {
            hot_iterations: raw.hot_iterations,
            recursive_iterations: raw.recursive_iterations,
            array_iterations: raw.array_iterations,
            memory_iterations: raw.memory_iterations,
            complex_iterations: raw.complex_iterations,
        }
    }
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub harness: HarnessConfig,
    pub targets: Vec<TargetConfig>,
    pub workload: WorkloadConfig,
}

impl Config {
    /// Every built-in target under `strategy`, with default settings.
    pub fn builtin(strategy: Strategy) -> Self {
        Self {
            harness: HarnessConfig::for_strategy(strategy),
            targets: Target::ALL.into_iter().map(TargetConfig::from).collect(),
            workload: WorkloadConfig::default(),
        }
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    /// Returns HardValidationError for any invalid fields.
    pub fn load_file(path: impl AsRef<Path>) -> HookResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HookError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HookError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> HookResult<Config> {
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| HookError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> HookResult<Config> {
        let harness = Self::validate_harness(raw.harness)?;

        let mut targets = Vec::with_capacity(raw.targets.len());
        let mut seen = HashSet::new();

        for (index, raw_target) in raw.targets.into_iter().enumerate() {
            let target = Self::validate_target(raw_target, index)?;

            if !seen.insert(target.name.clone()) {
                return Err(HardValidationError::DuplicateTarget {
                    name: target.name.to_string(),
                }
                .into());
            }

            targets.push(target);
        }

        if targets.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one target must be defined".to_string(),
            }
            .into());
        }

        let workload = Self::validate_workload(raw.workload)?;

        Ok(Config {
            harness,
            targets,
            workload,
        })
    }

    /// Validate the harness section.
    fn validate_harness(raw: RawHarnessConfig) -> HookResult<HarnessConfig> {
        if raw.module.trim().is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "module",
                context: "harness".to_string(),
            }
            .into());
        }

        if !(MIN_RETRY_DELAY_MS..=MAX_RETRY_DELAY_MS).contains(&raw.retry_delay_ms) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "retry_delay_ms",
                value: raw.retry_delay_ms.to_string(),
                reason: format!(
                    "Must be between {} and {} ms",
                    MIN_RETRY_DELAY_MS, MAX_RETRY_DELAY_MS
                ),
            }
            .into());
        }

        let string_marker = raw
            .string_marker
            .unwrap_or_else(|| raw.strategy.default_marker().to_string());

        if string_marker.is_empty() || string_marker.len() > MAX_MARKER_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "string_marker",
                value: string_marker,
                reason: format!("Must be 1 to {} bytes long", MAX_MARKER_LEN),
            }
            .into());
        }

        if string_marker.contains('\0') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "string_marker",
                value: string_marker.escape_debug().to_string(),
                reason: "Must not contain NUL bytes".to_string(),
            }
            .into());
        }

        if let Some(cpu) = raw.pin_cpu {
            // CPU sets are bounded by the kernel's CPU_SETSIZE.
            if cpu >= libc::CPU_SETSIZE as usize {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "pin_cpu",
                    value: cpu.to_string(),
                    reason: format!("Must be below {}", libc::CPU_SETSIZE),
                }
                .into());
            }
        }

        Ok(HarnessConfig {
            module: raw.module,
            strategy: raw.strategy,
            retry_delay: Duration::from_millis(raw.retry_delay_ms),
            sentinel: raw.sentinel,
            string_marker,
            pin_cpu: raw.pin_cpu,
        })
    }

    /// Validate a single target entry.
    ///
    /// A built-in target name picks up its known return kind when `returns`
    /// is omitted; any other name must state it.
    fn validate_target(raw: RawTargetConfig, index: usize) -> HookResult<TargetConfig> {
        let name = SymbolName::new(&raw.name)?;

        let returns = match (raw.returns, Target::from_name(name.as_str())) {
            (Some(kind), _) => kind,
            (None, Some(builtin)) => builtin.returns(),
            (None, None) => {
                return Err(HardValidationError::MissingRequiredField {
                    field: "returns",
                    context: format!("target at index {}", index),
                }
                .into())
            }
        };

        Ok(TargetConfig { name, returns })
    }

    /// Validate workload iteration counts.
    fn validate_workload(raw: RawWorkloadConfig) -> HookResult<WorkloadConfig> {
        let counts = [
            ("hot_iterations", raw.hot_iterations),
            ("recursive_iterations", raw.recursive_iterations),
            ("array_iterations", raw.array_iterations),
            ("memory_iterations", raw.memory_iterations),
            ("complex_iterations", raw.complex_iterations),
        ];

        for (field, value) in counts {
            if value == 0 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: "0".to_string(),
                    reason: "Iteration count must be greater than 0".to_string(),
                }
                .into());
            }
        }

        Ok(WorkloadConfig {
            hot_iterations: raw.hot_iterations,
            recursive_iterations: raw.recursive_iterations,
            array_iterations: raw.array_iterations,
            memory_iterations: raw.memory_iterations,
            complex_iterations: raw.complex_iterations,
        })
    }
}
