//! Cache Statistics Module
//!
//! Read-only snapshot of the engine's resident entries.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time statistics over the entries currently held by the cache.
///
/// `hit_rate` is the fraction of resident keys that have been read at least
/// once (`accessed keys / total keys`), not a request-level hit ratio. The
/// request-level ratio is tracked by [`crate::metrics::ServerMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of keys in the index
    pub total_keys: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Number of entries in the recency list
    pub size: usize,
    /// Sum of access counts over resident entries
    pub total_accesses: u64,
    /// Resident keys read at least once / resident keys
    pub hit_rate: f64,
    /// Sum of value sizes in bytes
    pub total_size_bytes: usize,
}

// == Stats Accumulator ==
/// Per-shard partial counts, merged into a [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsAccumulator {
    pub total_keys: usize,
    pub size: usize,
    pub accessed_keys: usize,
    pub total_accesses: u64,
    pub total_size_bytes: usize,
}

impl StatsAccumulator {
    /// Adds another shard's counts into this one.
    pub fn merge(&mut self, other: StatsAccumulator) {
        self.total_keys += other.total_keys;
        self.size += other.size;
        self.accessed_keys += other.accessed_keys;
        self.total_accesses = self.total_accesses.saturating_add(other.total_accesses);
        self.total_size_bytes += other.total_size_bytes;
    }

    // == Finish ==
    /// Produces the public snapshot for a cache of the given capacity.
    pub fn finish(self, capacity: usize) -> CacheStats {
        let hit_rate = if self.total_keys == 0 {
            0.0
        } else {
            self.accessed_keys as f64 / self.total_keys as f64
        };

        CacheStats {
            total_keys: self.total_keys,
            capacity,
            size: self.size,
            total_accesses: self.total_accesses,
            hit_rate,
            total_size_bytes: self.total_size_bytes,
        }
    }
}
