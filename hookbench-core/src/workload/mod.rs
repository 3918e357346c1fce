// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Synthetic workload run inside each probe.
//!
//! Provides:
//! - Cache key derivation (string and integer DJB2)
//! - Bounded caches (direct-mapped and FIFO)
//! - Sliding-window running statistics
//! - Numeric kernels (Fibonacci, primality, matrix reduction, mixing)
//! - The managed and native engine flavours composing all of the above

pub mod cache;
pub mod engine;
pub mod hash;
pub mod kernels;
pub mod statistics;

pub use cache::{BoundedCache, CacheCounters, DirectMappedCache, FifoCache};
pub use engine::{
    CacheOutcome, EngineFlavor, ManagedEngine, NativeEngine, ProbeCallRecord, Workload,
    WorkloadEngine, WorkloadSnapshot, SNAPSHOT_INTERVAL,
};
pub use hash::{CacheKey, KeyDerivation};
pub use statistics::{Analysis, RunningStatistics, SampleWindow};
