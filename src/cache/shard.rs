//! Cache Shard Module
//!
//! One lock's worth of cache: a key index and a recency list kept in step,
//! with LRU eviction and TTL expiration. Not thread-safe on its own;
//! [`crate::cache::CacheStore`] wraps each shard in a lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::cache::entry::EntryMetadata;
use crate::cache::lru::{RecencyList, SlotId};
use crate::cache::stats::StatsAccumulator;
use crate::cache::CacheEntry;

// == Cache Shard ==
/// Index + recency list pair with a fixed capacity.
///
/// Every key in `index` maps to exactly one live slot in `recency`, and every
/// live slot is reachable from `index` through its entry's key.
#[derive(Debug)]
pub struct CacheShard {
    /// Key to recency-list handle
    index: HashMap<Arc<str>, SlotId>,
    /// Entries ordered MRU (front) to LRU (back)
    recency: RecencyList<CacheEntry>,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl CacheShard {
    // == Constructor ==
    /// Creates an empty shard holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        // Avoid reserving huge arenas up front for memory-derived capacities
        let reserve = capacity.min(4096);
        Self {
            index: HashMap::with_capacity(reserve),
            recency: RecencyList::with_capacity(reserve),
            capacity,
        }
    }

    // == Get ==
    /// Returns the value for `key` and promotes it to most recently used.
    ///
    /// An expired entry is removed on the spot and reported as absent.
    pub fn get(&mut self, key: &str, now_ms: u64) -> Option<Bytes> {
        let id = *self.index.get(key)?;

        let expired = self
            .recency
            .get(id)
            .map_or(true, |entry| entry.is_expired_at(now_ms));
        if expired {
            self.remove_slot(key, id);
            debug!(key = %key, "lazily expired entry on read");
            return None;
        }

        self.recency.move_to_front(id);
        let entry = self.recency.get_mut(id)?;
        entry.record_access(now_ms);
        Some(entry.value.clone())
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry wholesale.
    ///
    /// The new entry becomes most recently used. Returns how many entries were
    /// evicted from the back of the recency list to stay within capacity.
    pub fn set(&mut self, key: &str, value: Bytes, ttl: Option<Duration>, now_ms: u64) -> usize {
        let key: Arc<str> = match self.index.remove_entry(key) {
            Some((existing, id)) => {
                self.recency.remove(id);
                existing
            }
            None => Arc::from(key),
        };

        let entry = CacheEntry::new(Arc::clone(&key), value, ttl, now_ms);
        let id = self.recency.push_front(entry);
        self.index.insert(key, id);

        self.enforce_capacity()
    }

    // == Delete ==
    /// Removes `key` if present, expired or not. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.recency.remove(id);
                true
            }
            None => false,
        }
    }

    // == Exists ==
    /// Read-only presence check; expired entries read as absent but stay in place.
    pub fn exists(&self, key: &str, now_ms: u64) -> bool {
        self.live_entry(key, now_ms).is_some()
    }

    // == Peek ==
    /// Read-only metadata lookup; does not count as an access.
    pub fn peek(&self, key: &str, now_ms: u64) -> Option<EntryMetadata> {
        self.live_entry(key, now_ms)
            .map(|entry| EntryMetadata::of(entry, now_ms))
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.index = HashMap::new();
        self.recency.clear();
    }

    // == Cleanup ==
    /// Removes every expired entry. Returns the number removed.
    pub fn cleanup_expired(&mut self, now_ms: u64) -> usize {
        let (removed, _) = self.cleanup_batch(0, usize::MAX, now_ms);
        removed
    }

    /// Examines up to `batch` arena slots starting at `cursor`, removing expired entries.
    ///
    /// Returns the number removed and the cursor to resume from, or `None` once
    /// the end of the arena has been reached.
    pub fn cleanup_batch(&mut self, cursor: usize, batch: usize, now_ms: u64) -> (usize, Option<usize>) {
        let end = cursor.saturating_add(batch).min(self.recency.slot_count());
        let mut removed = 0;

        for slot in cursor..end {
            let Some(id) = self.recency.id_at(slot) else {
                continue;
            };
            let expired_key = match self.recency.get(id) {
                Some(entry) if entry.is_expired_at(now_ms) => Arc::clone(&entry.key),
                _ => continue,
            };
            self.remove_slot(&expired_key, id);
            removed += 1;
        }

        let next = (end < self.recency.slot_count()).then_some(end);
        (removed, next)
    }

    // == Stats ==
    /// Partial statistics for this shard.
    pub fn stats(&self) -> StatsAccumulator {
        let mut acc = StatsAccumulator {
            total_keys: self.index.len(),
            size: self.recency.len(),
            ..StatsAccumulator::default()
        };
        for entry in self.recency.values() {
            acc.total_accesses = acc.total_accesses.saturating_add(entry.access_count);
            if entry.access_count > 0 {
                acc.accessed_keys += 1;
            }
            acc.total_size_bytes += entry.size_bytes();
        }
        acc
    }

    /// Current number of entries, including expired entries not yet removed.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<Arc<str>> {
        self.recency.iter().map(|entry| Arc::clone(&entry.key)).collect()
    }

    // == Invariants ==
    /// Verifies the index and recency list describe the same set of entries.
    pub fn validate_invariants(&self) -> Result<(), String> {
        self.recency.check_links()?;

        if self.index.len() != self.recency.len() {
            return Err(format!(
                "index has {} keys, recency list has {} nodes",
                self.index.len(),
                self.recency.len()
            ));
        }
        if self.index.len() > self.capacity {
            return Err(format!(
                "{} entries exceed capacity {}",
                self.index.len(),
                self.capacity
            ));
        }
        for (key, id) in &self.index {
            match self.recency.get(*id) {
                Some(entry) if entry.key == *key => {}
                Some(entry) => {
                    return Err(format!("key {:?} points at entry for {:?}", key, entry.key))
                }
                None => return Err(format!("key {:?} points at a free slot", key)),
            }
        }
        Ok(())
    }

    fn live_entry(&self, key: &str, now_ms: u64) -> Option<&CacheEntry> {
        let id = self.index.get(key)?;
        self.recency
            .get(*id)
            .filter(|entry| !entry.is_expired_at(now_ms))
    }

    fn remove_slot(&mut self, key: &str, id: SlotId) {
        self.index.remove(key);
        self.recency.remove(id);
    }

    /// Evicts from the LRU end until the shard fits its capacity.
    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.recency.len() > self.capacity {
            let Some(entry) = self.recency.pop_back() else {
                break;
            };
            self.index.remove(&*entry.key);
            debug!(key = %entry.key, "evicted least recently used entry");
            evicted += 1;
        }
        evicted
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn bytes(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    fn keys(shard: &CacheShard) -> Vec<String> {
        shard.keys_by_recency().iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_shard_set_and_get() {
        let mut shard = CacheShard::new(10);

        assert_eq!(shard.set("key1", bytes("value1"), None, 0), 0);
        assert_eq!(shard.get("key1", 0), Some(bytes("value1")));
        assert_eq!(shard.len(), 1);
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_shard_get_nonexistent() {
        let mut shard = CacheShard::new(10);
        assert_eq!(shard.get("nope", 0), None);
    }

    #[test]
    fn test_get_updates_access_stats() {
        let mut shard = CacheShard::new(10);
        shard.set("k", bytes("v"), None, 100);

        shard.get("k", 200);
        shard.get("k", 300);

        let meta = shard.peek("k", 400).unwrap();
        assert_eq!(meta.access_count, 2);
        assert_eq!(meta.last_accessed_at, 300);
        assert_eq!(meta.created_at, 100);
    }

    #[test]
    fn test_lru_evicts_first_inserted() {
        let mut shard = CacheShard::new(3);
        shard.set("key1", bytes("v"), None, 0);
        shard.set("key2", bytes("v"), None, 0);
        shard.set("key3", bytes("v"), None, 0);

        assert_eq!(shard.set("key4", bytes("v"), None, 0), 1);

        assert_eq!(shard.len(), 3);
        assert!(shard.get("key1", 0).is_none());
        assert_eq!(keys(&shard), vec!["key4", "key3", "key2"]);
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_get_promotes_entry() {
        let mut shard = CacheShard::new(2);
        shard.set("A", bytes("a"), None, 0);
        shard.set("B", bytes("b"), None, 0);
        shard.get("A", 0);
        shard.set("C", bytes("c"), None, 0);

        assert!(shard.exists("A", 0));
        assert!(!shard.exists("B", 0));
        assert!(shard.exists("C", 0));
    }

    #[test]
    fn test_overwrite_moves_to_front_and_resets_stats() {
        let mut shard = CacheShard::new(3);
        shard.set("a", bytes("1"), None, 0);
        shard.set("b", bytes("2"), None, 0);
        shard.get("a", 5);

        assert_eq!(shard.set("b", bytes("3"), None, 10), 0);

        assert_eq!(keys(&shard), vec!["b", "a"]);
        let meta = shard.peek("b", 10).unwrap();
        assert_eq!(meta.access_count, 0);
        assert_eq!(meta.created_at, 10);
        assert_eq!(shard.len(), 2);
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_overwrite_replaces_ttl() {
        let mut shard = CacheShard::new(3);
        shard.set("k", bytes("v1"), Some(Duration::from_secs(3600)), 0);
        shard.set("k", bytes("v2"), None, 0);

        assert_eq!(shard.get("k", 2 * HOUR_MS), Some(bytes("v2")));
    }

    #[test]
    fn test_lazy_expiration_on_get() {
        let mut shard = CacheShard::new(3);
        shard.set("k", bytes("v"), Some(Duration::from_millis(1)), 0);

        assert_eq!(shard.get("k", 5), None);
        // Removed from both structures
        assert_eq!(shard.len(), 0);
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_exists_does_not_mutate() {
        let mut shard = CacheShard::new(2);
        shard.set("A", bytes("a"), None, 0);
        shard.set("B", bytes("b"), None, 0);

        assert!(shard.exists("A", 0));
        // A stays least recently used
        shard.set("C", bytes("c"), None, 0);
        assert!(!shard.exists("A", 0));
        assert_eq!(shard.peek("B", 0).unwrap().access_count, 0);
    }

    #[test]
    fn test_exists_defers_removal_of_expired() {
        let mut shard = CacheShard::new(3);
        shard.set("k", bytes("v"), Some(Duration::from_millis(10)), 0);

        assert!(!shard.exists("k", 10));
        assert!(shard.peek("k", 10).is_none());
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn test_delete_idempotent() {
        let mut shard = CacheShard::new(3);
        assert!(!shard.delete("missing"));

        shard.set("k", bytes("v"), None, 0);
        assert!(shard.delete("k"));
        assert!(!shard.delete("k"));
        assert!(shard.is_empty());
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_delete_expired_reports_removal() {
        let mut shard = CacheShard::new(3);
        shard.set("k", bytes("v"), Some(Duration::from_millis(1)), 0);
        assert!(shard.delete("k"));
    }

    #[test]
    fn test_clear() {
        let mut shard = CacheShard::new(3);
        shard.set("a", bytes("1"), None, 0);
        shard.set("b", bytes("2"), None, 0);
        shard.clear();

        assert!(shard.is_empty());
        assert!(shard.get("a", 0).is_none());
        shard.validate_invariants().unwrap();

        shard.set("c", bytes("3"), None, 0);
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let mut shard = CacheShard::new(10);
        shard.set("short1", bytes("v"), Some(Duration::from_millis(100)), 0);
        shard.set("short2", bytes("v"), Some(Duration::from_millis(100)), 0);
        shard.set("long", bytes("v"), Some(Duration::from_secs(10)), 0);
        shard.set("forever", bytes("v"), None, 0);

        assert_eq!(shard.cleanup_expired(50), 0);
        assert_eq!(shard.cleanup_expired(100), 2);
        assert_eq!(shard.len(), 2);
        assert_eq!(shard.stats().total_keys, 2);
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_cleanup_batch_resumes() {
        let mut shard = CacheShard::new(10);
        for i in 0..5 {
            shard.set(&format!("k{}", i), bytes("v"), Some(Duration::from_millis(1)), 0);
        }

        let (removed, next) = shard.cleanup_batch(0, 2, 10);
        assert_eq!(removed, 2);
        assert_eq!(next, Some(2));

        let (removed, next) = shard.cleanup_batch(2, 2, 10);
        assert_eq!(removed, 2);
        assert_eq!(next, Some(4));

        let (removed, next) = shard.cleanup_batch(4, 2, 10);
        assert_eq!(removed, 1);
        assert_eq!(next, None);

        assert!(shard.is_empty());
        shard.validate_invariants().unwrap();
    }

    #[test]
    fn test_stats() {
        let mut shard = CacheShard::new(10);
        shard.set("a", bytes("12345"), None, 0);
        shard.set("b", bytes("123"), None, 0);
        shard.get("a", 0);
        shard.get("a", 0);

        let stats = shard.stats().finish(shard.capacity());
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.total_accesses, 2);
        assert_eq!(stats.total_size_bytes, 8);
        assert_eq!(stats.hit_rate, 0.5);
    }
}
