//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// The entry's position in the recency list is the slot it occupies in the
/// shard's arena; the index maps its key to that slot.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The key, shared with the shard index
    pub key: Arc<str>,
    /// The stored value
    pub value: Bytes,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Timestamp of the last successful read (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of successful reads since insertion
    pub access_count: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live, measured from `now_ms`
    /// * `now_ms` - Current Unix timestamp in milliseconds
    pub fn new(key: Arc<str>, value: Bytes, ttl: Option<Duration>, now_ms: u64) -> Self {
        Self {
            key,
            value,
            created_at: now_ms,
            expires_at: ttl.map(|ttl| now_ms.saturating_add(ttl_to_ms(ttl))),
            last_accessed_at: now_ms,
            access_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time, i.e. as soon as the TTL has fully elapsed.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Record Access ==
    /// Updates access statistics after a successful read.
    pub fn record_access(&mut self, now_ms: u64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_at = now_ms;
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now_ms))
    }

    /// Size of the stored value in bytes.
    pub fn size_bytes(&self) -> usize {
        self.value.len()
    }
}

// == Entry Metadata ==
/// Read-only view of an entry's bookkeeping, without its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub expires_at: Option<u64>,
    pub access_count: u64,
    pub size_bytes: usize,
    pub ttl_remaining_ms: Option<u64>,
}

impl EntryMetadata {
    /// Captures an entry's metadata as seen at `now_ms`.
    pub fn of(entry: &CacheEntry, now_ms: u64) -> Self {
        Self {
            created_at: entry.created_at,
            last_accessed_at: entry.last_accessed_at,
            expires_at: entry.expires_at,
            access_count: entry.access_count,
            size_bytes: entry.size_bytes(),
            ttl_remaining_ms: entry.ttl_remaining_ms(now_ms),
        }
    }
}

/// Converts a TTL to whole milliseconds; any non-zero TTL lasts at least 1 ms.
fn ttl_to_ms(ttl: Duration) -> u64 {
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !ttl.is_zero() {
        1
    } else {
        ms
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Option<Duration>, now: u64) -> CacheEntry {
        CacheEntry::new(Arc::from("k"), Bytes::from_static(b"test_value"), ttl, now)
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = entry(None, 1_000);

        assert_eq!(&entry.value[..], b"test_value");
        assert!(entry.expires_at.is_none());
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.last_accessed_at, 1_000);
        assert_eq!(entry.access_count, 0);
        assert!(!entry.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = entry(Some(Duration::from_secs(60)), 1_000);

        assert_eq!(entry.expires_at, Some(61_000));
        assert!(!entry.is_expired_at(60_999));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry(Some(Duration::from_millis(10)), 1_000);

        assert!(!entry.is_expired_at(1_009));
        assert!(entry.is_expired_at(1_010), "Entry should be expired at boundary");
    }

    #[test]
    fn test_sub_millisecond_ttl_rounds_up() {
        let entry = entry(Some(Duration::from_micros(10)), 1_000);
        assert_eq!(entry.expires_at, Some(1_001));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let entry = entry(Some(Duration::ZERO), 1_000);
        assert!(entry.is_expired_at(1_000));
    }

    #[test]
    fn test_record_access() {
        let mut entry = entry(None, 1_000);
        entry.record_access(1_500);
        entry.record_access(2_000);

        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, 2_000);
        assert_eq!(entry.created_at, 1_000);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = entry(Some(Duration::from_secs(10)), 1_000);

        assert_eq!(entry.ttl_remaining_ms(1_000), Some(10_000));
        assert_eq!(entry.ttl_remaining_ms(6_000), Some(5_000));
        // Clamped at zero once expired
        assert_eq!(entry.ttl_remaining_ms(50_000), Some(0));
    }

    #[test]
    fn test_metadata_snapshot() {
        let mut entry = entry(Some(Duration::from_secs(5)), 1_000);
        entry.record_access(2_000);

        let meta = EntryMetadata::of(&entry, 3_000);
        assert_eq!(meta.access_count, 1);
        assert_eq!(meta.last_accessed_at, 2_000);
        assert_eq!(meta.size_bytes, 10);
        assert_eq!(meta.ttl_remaining_ms, Some(3_000));
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        assert!(entry(None, 1_000).ttl_remaining_ms(5_000).is_none());
    }
}
