// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for hookbench.
//!
//! Explicit enum error types only. No `Box<dyn Error>` and no `anyhow::Result`
//! in library code. The workload kernels never produce errors; everything
//! here lives at the harness boundary (config, resolution, attachment).

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Address, SymbolName};

/// Top-level error type for the hookbench harness.
#[derive(Debug, Error)]
pub enum HookError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Resolution Errors - Logged and Skipped by the Harness
    // =========================================================================
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    // =========================================================================
    // Attachment Errors - Isolated to One Symbol
    // =========================================================================
    #[error("Attach error: {0}")]
    Attach(#[from] AttachError),

    // =========================================================================
    // eBPF Errors
    // =========================================================================
    #[error("eBPF error: {0}")]
    Ebpf(#[from] EbpfError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors abort startup.
/// Raised when the configuration cannot describe a runnable harness.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid symbol name: {name:?} - {reason}")]
    InvalidSymbol { name: String, reason: String },

    #[error("Null address for symbol {symbol}")]
    NullAddress { symbol: String },

    #[error("Duplicate target: {name}")]
    DuplicateTarget { name: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Module and symbol resolution failures.
///
/// Both are non-fatal: the harness logs them and moves on (or, for a module
/// that is not loaded yet, retries after a fixed delay).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Module not found: {module}")]
    ModuleNotFound { module: String },

    #[error("Symbol {symbol} not exported by {module}")]
    SymbolNotFound { module: String, symbol: SymbolName },
}

/// Probe attachment failures, caught per symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("Address {address} is already instrumented")]
    AlreadyInstrumented { address: Address },

    #[error("Invalid target address {address}: {reason}")]
    InvalidAddress { address: Address, reason: String },

    #[error("No attachment at {address}")]
    NotAttached { address: Address },
}

/// eBPF backend errors.
#[derive(Debug, Error)]
pub enum EbpfError {
    #[error("Failed to load eBPF program: {reason}")]
    LoadFailed { reason: String },

    #[error("Failed to attach uprobe to {symbol} in {target}: {reason}")]
    AttachFailed {
        symbol: String,
        target: String,
        reason: String,
    },

    #[error("BPF map '{name}' not found")]
    MapNotFound { name: String },

    #[error("BPF map operation '{operation}' failed: {reason}")]
    MapOperationFailed { operation: String, reason: String },

    #[error("Probe program not loaded")]
    NotLoaded,
}

/// Result type alias using HookError.
pub type HookResult<T> = Result<T, HookError>;
