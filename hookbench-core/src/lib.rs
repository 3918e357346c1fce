// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Hookbench Core Library
//!
//! Core library for the hookbench instrumentation benchmark.
//! Provides the synthetic workload engine, probe abstractions, the probe
//! harness and its strategies, configuration parsing and the built-in
//! target library.

pub mod config;
pub mod error;
pub mod harness;
pub mod probe;
pub mod stats;
pub mod targets;
pub mod types;
pub mod workload;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, HarnessConfig, TargetConfig, WorkloadConfig};
pub use error::{AttachError, EbpfError, HardValidationError, HookError, HookResult, ResolutionError};
pub use harness::{InstallReport, NativeEntry, NativeWorkload, ProbeHarness, Strategy};
pub use probe::{
    CallArgs, DlResolver, EntryToken, ExportTable, InProcessInterceptor, Interceptor,
    ModuleResolver, ProbeListener, ReturnValue, StaticResolver,
};
pub use stats::HarnessStats;
pub use targets::{Target, TargetCaller, TargetLibrary};
pub use types::{Address, ProcessId, ReturnKind, SymbolName};
pub use workload::{ManagedEngine, NativeEngine, ProbeCallRecord, Workload};
