// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bounded caches for the workload engine.
//!
//! Two eviction policies, one per engine flavour:
//!
//! - [`DirectMappedCache`]: fixed array, slot = key mod capacity, newest write
//!   wins on collision. No chaining and no bookkeeping.
//! - [`FifoCache`]: key → value map with a size ceiling. Once the ceiling is
//!   exceeded the single oldest-inserted key is dropped. Overwriting an
//!   existing key keeps its original insertion position.
//!
//! Neither policy tracks recency and neither expires entries.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::workload::hash::CacheKey;

/// Slot count of the native direct-mapped cache.
pub const DIRECT_MAPPED_CAPACITY: usize = 1024;

/// Entry ceiling of the managed FIFO cache.
pub const FIFO_CEILING: usize = 5000;

/// Hit/miss counters, incremented on every lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
}

impl CacheCounters {
    fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Common surface of both cache policies.
pub trait BoundedCache<V: Copy> {
    /// Look a key up, counting the hit or miss.
    fn lookup(&mut self, key: CacheKey) -> Option<V>;

    /// Store a value, unconditionally replacing whatever holds the key's slot.
    fn store(&mut self, key: CacheKey, value: V);

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Maximum number of live entries.
    fn capacity(&self) -> usize;

    fn counters(&self) -> CacheCounters;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry<V> {
    key: u32,
    value: V,
    valid: bool,
}

/// Direct-mapped cache with `N` slots.
#[derive(Debug, Clone)]
pub struct DirectMappedCache<V, const N: usize = DIRECT_MAPPED_CAPACITY> {
    entries: Box<[CacheEntry<V>]>,
    counters: CacheCounters,
}

impl<V: Copy + Default, const N: usize> DirectMappedCache<V, N> {
    pub fn new() -> Self {
        assert!(N > 0, "direct-mapped cache needs at least one slot");
        Self {
            entries: vec![CacheEntry::default(); N].into_boxed_slice(),
            counters: CacheCounters::default(),
        }
    }

    /// Invalidate every slot and zero the counters.
    pub fn reset(&mut self) {
        self.entries.fill(CacheEntry::default());
        self.counters = CacheCounters::default();
    }
}

impl<V: Copy + Default, const N: usize> Default for DirectMappedCache<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + Default, const N: usize> BoundedCache<V> for DirectMappedCache<V, N> {
    fn lookup(&mut self, key: CacheKey) -> Option<V> {
        let entry = &self.entries[key.slot(N)];
        let found = (entry.valid && entry.key == key.value()).then_some(entry.value);
        self.counters.record(found.is_some());
        found
    }

    fn store(&mut self, key: CacheKey, value: V) {
        self.entries[key.slot(N)] = CacheEntry {
            key: key.value(),
            value,
            valid: true,
        };
    }

    fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    fn capacity(&self) -> usize {
        N
    }

    fn counters(&self) -> CacheCounters {
        self.counters
    }
}

/// Map-backed cache that evicts by insertion order.
#[derive(Debug, Clone)]
pub struct FifoCache<V> {
    values: HashMap<CacheKey, V>,
    order: VecDeque<CacheKey>,
    ceiling: usize,
    counters: CacheCounters,
}

impl<V: Copy> FifoCache<V> {
    pub fn new(ceiling: usize) -> Self {
        assert!(ceiling > 0, "FIFO cache ceiling must be non-zero");
        Self {
            values: HashMap::with_capacity(ceiling + 1),
            order: VecDeque::with_capacity(ceiling + 1),
            ceiling,
            counters: CacheCounters::default(),
        }
    }

    /// Oldest live key, the next eviction victim.
    pub fn oldest(&self) -> Option<CacheKey> {
        self.order.front().copied()
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.order.clear();
        self.counters = CacheCounters::default();
    }
}

impl<V: Copy> Default for FifoCache<V> {
    fn default() -> Self {
        Self::new(FIFO_CEILING)
    }
}

impl<V: Copy> BoundedCache<V> for FifoCache<V> {
    fn lookup(&mut self, key: CacheKey) -> Option<V> {
        let found = self.values.get(&key).copied();
        self.counters.record(found.is_some());
        found
    }

    fn store(&mut self, key: CacheKey, value: V) {
        if self.values.insert(key, value).is_some() {
            return;
        }
        self.order.push_back(key);
        if self.values.len() > self.ceiling {
            if let Some(evicted) = self.order.pop_front() {
                self.values.remove(&evicted);
            }
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.ceiling
    }

    fn counters(&self) -> CacheCounters {
        self.counters
    }
}
