//! Cache Store Module
//!
//! The thread-safe cache engine. Keys are spread over one or more
//! [`CacheShard`]s by hash, each behind its own `RwLock`.
//!
//! # Locking
//! - `get`, `set`, `delete`, `clear`, `cleanup` take a shard's write lock
//!   (`get` promotes the entry and bumps its access count).
//! - `exists`, `peek`, `stats` take read locks and never mutate.
//! - `clear` and `stats` lock every shard in index order before acting, so
//!   they observe or reset all shards as one unit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, info};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::stats::StatsAccumulator;
use crate::cache::{CacheShard, CacheStats, EntryMetadata};
use crate::error::{CacheError, Result};

/// Arena slots examined per lock hold by [`CacheStore::cleanup`].
pub const DEFAULT_CLEANUP_BATCH: usize = 1024;

// == Cache Store ==
/// Bounded LRU cache with per-entry TTL, safe to share across threads.
///
/// With a single shard (the default) recency order is global: inserting
/// `capacity + 1` distinct keys evicts exactly the first one. With several
/// shards the capacity is split between them and LRU order holds per shard.
/// Recency is a total order, so there are never ties when picking a victim.
#[derive(Debug)]
pub struct CacheStore {
    shards: Box<[RwLock<CacheShard>]>,
    /// Maximum number of entries across all shards
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a single-shard store on the system clock.
    ///
    /// # Errors
    /// `InvalidConfig` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_options(capacity, 1, Arc::new(SystemClock::new()))
    }

    /// Creates a store with an explicit shard count and time source.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries across all shards
    /// * `shard_count` - Number of independently locked shards
    /// * `clock` - Time source for timestamps and TTL checks
    ///
    /// # Errors
    /// `InvalidConfig` if `capacity` or `shard_count` is zero, or if there
    /// are more shards than entries.
    pub fn with_options(capacity: usize, shard_count: usize, clock: Arc<dyn Clock>) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if shard_count == 0 {
            return Err(CacheError::InvalidConfig(
                "shard count must be at least 1".to_string(),
            ));
        }
        if shard_count > capacity {
            return Err(CacheError::InvalidConfig(format!(
                "shard count {} exceeds capacity {}",
                shard_count, capacity
            )));
        }

        // Per-shard capacities sum to exactly `capacity`
        let base = capacity / shard_count;
        let remainder = capacity % shard_count;
        let shards = (0..shard_count)
            .map(|i| RwLock::new(CacheShard::new(base + usize::from(i < remainder))))
            .collect();

        debug!(capacity, shard_count, "cache store created");
        Ok(Self {
            shards,
            capacity,
            clock,
        })
    }

    // == Get ==
    /// Returns the value for `key` if present and unexpired, marking it most
    /// recently used. An expired entry found here is removed immediately.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = self.clock.now_ms();
        self.shard_for(key).write().get(key, now)
    }

    // == Set ==
    /// Stores `value` under `key` with an optional TTL.
    ///
    /// Any existing entry is replaced entirely (value, TTL, access stats) and
    /// the key becomes most recently used. Returns the number of entries
    /// evicted to stay within capacity.
    pub fn set(&self, key: &str, value: impl Into<Bytes>, ttl: Option<Duration>) -> usize {
        let value = value.into();
        let now = self.clock.now_ms();
        self.shard_for(key).write().set(key, value, ttl, now)
    }

    // == Delete ==
    /// Removes `key`. Returns true if an entry was present, even if it had
    /// already expired but not yet been reaped.
    pub fn delete(&self, key: &str) -> bool {
        self.shard_for(key).write().delete(key)
    }

    // == Exists ==
    /// Returns true if `key` holds an unexpired entry.
    ///
    /// Does not touch recency or access counts. An expired entry is reported
    /// absent but left in place for `get` or the reaper to remove, so `len`
    /// may briefly count it.
    pub fn exists(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.shard_for(key).read().exists(key, now)
    }

    // == Peek ==
    /// Returns the bookkeeping of a live entry without counting an access.
    pub fn peek(&self, key: &str) -> Option<EntryMetadata> {
        let now = self.clock.now_ms();
        self.shard_for(key).read().peek(key, now)
    }

    // == Clear ==
    /// Removes every entry from every shard atomically.
    pub fn clear(&self) {
        let mut guards: Vec<_> = self.shards.iter().map(|shard| shard.write()).collect();
        for guard in guards.iter_mut() {
            guard.clear();
        }
        info!("cache cleared");
    }

    // == Cleanup ==
    /// Removes every expired entry. Returns the number removed.
    ///
    /// Each shard is scanned in batches of [`DEFAULT_CLEANUP_BATCH`] slots,
    /// releasing its lock between batches.
    pub fn cleanup(&self) -> usize {
        self.cleanup_with_batch(DEFAULT_CLEANUP_BATCH)
    }

    /// Like [`cleanup`](Self::cleanup) with a custom batch size.
    pub fn cleanup_with_batch(&self, batch: usize) -> usize {
        (0..self.shards.len())
            .map(|shard| self.cleanup_shard(shard, batch))
            .sum()
    }

    /// Removes expired entries from one shard, `batch` slots per lock hold.
    ///
    /// Expiry is checked under the lock for each entry at the moment it is
    /// removed. Entries inserted into already-scanned slots during the sweep
    /// are left for the next one.
    pub fn cleanup_shard(&self, shard: usize, batch: usize) -> usize {
        let mut removed = 0;
        let mut cursor = Some(0);

        while let Some(start) = cursor {
            let (count, next) = self.cleanup_step(shard, start, batch);
            removed += count;
            cursor = next;
        }
        removed
    }

    /// Scans one batch of `shard`'s slots starting at `cursor`.
    ///
    /// Returns the number removed and the cursor to resume from, or `None`
    /// once the shard has been fully scanned. The lock is released fairly, so
    /// threads queued behind the sweep get it before the next batch does.
    pub fn cleanup_step(&self, shard: usize, cursor: usize, batch: usize) -> (usize, Option<usize>) {
        let Some(lock) = self.shards.get(shard) else {
            return (0, None);
        };
        let now = self.clock.now_ms();

        let mut guard = lock.write();
        let step = guard.cleanup_batch(cursor, batch.max(1), now);
        RwLockWriteGuard::unlock_fair(guard);
        step
    }

    // == Stats ==
    /// Snapshot of resident entries across all shards.
    pub fn stats(&self) -> CacheStats {
        let guards: Vec<_> = self.shards.iter().map(|shard| shard.read()).collect();
        let mut acc = StatsAccumulator::default();
        for guard in &guards {
            acc.merge(guard.stats());
        }
        acc.finish(self.capacity)
    }

    // == Length ==
    /// Number of physically present entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Checks the index/recency invariants of every shard.
    pub fn validate_invariants(&self) -> std::result::Result<(), String> {
        let mut total = 0;
        for (i, shard) in self.shards.iter().enumerate() {
            let guard = shard.read();
            guard
                .validate_invariants()
                .map_err(|err| format!("shard {}: {}", i, err))?;
            total += guard.len();
        }
        if total > self.capacity {
            return Err(format!("{} entries exceed capacity {}", total, self.capacity));
        }
        Ok(())
    }

    fn shard_for(&self, key: &str) -> &RwLock<CacheShard> {
        if self.shards.len() == 1 {
            return &self.shards[0];
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}
