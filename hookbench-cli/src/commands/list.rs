// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookbench list` command - List configured targets.
//!
//! Shows each target with its resolved address in the built-in library.

use hookbench_core::{DlResolver, ModuleResolver, TargetLibrary};

use super::ConfigSource;

pub async fn execute(source: &ConfigSource<'_>, loaded: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = source.load(None)?;
    let resolver = TargetLibrary::resolver();
    let module = resolver.find_module(&config.harness.module).ok();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                      CONFIGURED TARGETS                      ║");
    println!("╠══════════════════════════╦════════════╦══════════════════════╣");
    println!("║ Symbol                   ║ Returns    ║ Address              ║");
    println!("╠══════════════════════════╬════════════╬══════════════════════╣");

    for target in &config.targets {
        let address = module
            .as_ref()
            .and_then(|m| resolver.resolve(m, &target.name).ok())
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unresolved".to_string());

        println!(
            "║ {:<24} ║ {:<10} ║ {:<20} ║",
            target.name.as_str(),
            target.returns.to_string(),
            address
        );
    }

    println!("╚══════════════════════════╩════════════╩══════════════════════╝");
    println!();
    println!(
        "Total: {} target(s) in {} (strategy: {})",
        config.targets.len(),
        config.harness.module,
        config.harness.strategy
    );

    if loaded {
        println!();
        println!("Loaded modules:");
        for name in DlResolver::new().loaded_module_names() {
            println!("  • {}", name);
        }
    }

    Ok(())
}
