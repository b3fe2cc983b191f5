//! Cache Module
//!
//! In-process key/value cache with LRU eviction and per-entry TTL expiration.

mod clock;
mod entry;
mod lru;
mod shard;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryMetadata};
pub use lru::{RecencyList, SlotId};
pub use shard::CacheShard;
pub use stats::CacheStats;
pub use store::{CacheStore, DEFAULT_CLEANUP_BATCH};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
