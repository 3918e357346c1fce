// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use std::sync::Arc;

use hookbench_core::targets::MODULE_NAME;
use hookbench_core::{
    Config, ConfigLoader, HardValidationError, HookResult, InProcessInterceptor, ProbeHarness,
    Strategy, TargetLibrary,
};

pub mod list;
pub mod run;
pub mod stats;
pub mod validate;

/// Where a command gets its configuration from.
pub struct ConfigSource<'a> {
    path: &'a str,
    builtin: bool,
}

impl<'a> ConfigSource<'a> {
    pub fn new(path: &'a str, builtin: bool) -> Self {
        Self { path, builtin }
    }

    /// Load the configuration, applying a strategy override if given.
    pub fn load(&self, strategy: Option<Strategy>) -> HookResult<Config> {
        let mut config = if self.builtin {
            Config::builtin(strategy.unwrap_or(Strategy::Both))
        } else {
            ConfigLoader::load_file(self.path)?
        };

        if let Some(strategy) = strategy {
            config.harness.strategy = strategy;
            config.harness.string_marker = strategy.default_marker().to_string();
        }

        Ok(config)
    }
}

/// The built-in resolver answers for one module only; any other name would
/// keep the install retrying forever.
fn check_builtin_module(config: &Config) -> Result<(), HardValidationError> {
    if config.harness.module != MODULE_NAME {
        return Err(HardValidationError::InvalidFieldValue {
            field: "harness.module",
            value: config.harness.module.clone(),
            reason: format!("the built-in target library only provides {}", MODULE_NAME),
        });
    }
    Ok(())
}

/// Build a harness over the built-in target library and install it.
pub async fn install_harness(
    config: &Config,
) -> HookResult<(Arc<InProcessInterceptor>, ProbeHarness)> {
    check_builtin_module(config)?;

    let interceptor = Arc::new(InProcessInterceptor::new());
    let harness = ProbeHarness::new(
        config.harness.clone(),
        config.targets.clone(),
        Arc::new(TargetLibrary::resolver()),
        interceptor.clone(),
        Some(hookbench_native::native_workload()),
    )?;

    let report = harness.install().await;
    tracing::info!(
        module = %report.module,
        hooked = report.hooked_count(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        "Harness installed"
    );

    Ok((interceptor, harness))
}
