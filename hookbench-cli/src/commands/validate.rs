// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookbench validate` command - Validate configuration file.

use hookbench_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Harness Settings:");
            println!("  Module:         {}", config.harness.module);
            println!("  Strategy:       {}", config.harness.strategy);
            println!(
                "  Retry Delay:    {}ms",
                config.harness.retry_delay.as_millis()
            );
            println!("  Sentinel:       {:#x}", config.harness.sentinel);
            println!("  String Marker:  {}", config.harness.string_marker);
            match config.harness.pin_cpu {
                Some(cpu) => println!("  Pinned CPU:     {}", cpu),
                None => println!("  Pinned CPU:     none"),
            }
            println!();
            println!("Workload:");
            print!("{}", serde_yaml::to_string(&config.workload)?);
            println!();
            println!("Targets ({}):", config.targets.len());
            for target in &config.targets {
                println!("  - {} (returns: {})", target.name, target.returns);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
