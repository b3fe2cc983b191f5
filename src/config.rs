//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Direct entry limit; takes precedence over the memory budget when set
    pub max_entries: Option<usize>,
    /// Memory budget in bytes, divided by `entry_overhead_bytes` to get capacity
    pub max_memory_bytes: u64,
    /// Assumed cost of one entry in bytes
    pub entry_overhead_bytes: u64,
    /// TTL in seconds applied to HTTP sets that carry none; 0 = no expiration
    pub default_ttl: u64,
    /// HTTP bind host
    pub server_host: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Number of independently locked cache shards
    pub shard_count: usize,
    /// Arena slots the reaper examines per lock hold
    pub cleanup_batch_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: unset)
    /// - `MAX_MEMORY_BYTES` - Memory budget (default: 64 MiB)
    /// - `ENTRY_OVERHEAD_BYTES` - Assumed bytes per entry (default: 1024)
    /// - `DEFAULT_TTL` - Default TTL in seconds, 0 = none (default: 0)
    /// - `SERVER_HOST` - Bind host (default: 0.0.0.0)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `SHARD_COUNT` - Cache shards (default: 1)
    /// - `CLEANUP_BATCH_SIZE` - Slots per cleanup batch (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_parse("MAX_ENTRIES"),
            max_memory_bytes: env_parse("MAX_MEMORY_BYTES").unwrap_or(defaults.max_memory_bytes),
            entry_overhead_bytes: env_parse("ENTRY_OVERHEAD_BYTES")
                .unwrap_or(defaults.entry_overhead_bytes),
            default_ttl: env_parse("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: env_parse("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            shard_count: env_parse("SHARD_COUNT").unwrap_or(defaults.shard_count),
            cleanup_batch_size: env_parse("CLEANUP_BATCH_SIZE")
                .unwrap_or(defaults.cleanup_batch_size),
        }
    }

    // == Capacity ==
    /// Entry capacity: `max_entries` if set, else memory budget / per-entry overhead.
    pub fn capacity(&self) -> usize {
        match self.max_entries {
            Some(entries) => entries,
            None => self
                .max_memory_bytes
                .checked_div(self.entry_overhead_bytes)
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
                .unwrap_or(0),
        }
    }

    /// Default TTL for HTTP sets, if any.
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl > 0).then(|| Duration::from_secs(self.default_ttl))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    // == Validate ==
    /// Rejects configurations the cache engine or reaper cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries.is_none() && self.entry_overhead_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "ENTRY_OVERHEAD_BYTES must be greater than 0".to_string(),
            ));
        }
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be at least 1 entry".to_string(),
            ));
        }
        if self.shard_count == 0 {
            return Err(CacheError::InvalidConfig(
                "SHARD_COUNT must be at least 1".to_string(),
            ));
        }
        if self.shard_count > capacity {
            return Err(CacheError::InvalidConfig(format!(
                "SHARD_COUNT {} exceeds capacity {}",
                self.shard_count, capacity
            )));
        }
        if self.cleanup_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "CLEANUP_INTERVAL must be at least 1 second".to_string(),
            ));
        }
        if self.cleanup_batch_size == 0 {
            return Err(CacheError::InvalidConfig(
                "CLEANUP_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: None,
            max_memory_bytes: 64 * 1024 * 1024,
            entry_overhead_bytes: 1024,
            default_ttl: 0,
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            cleanup_interval: 1,
            shard_count: 1,
            cleanup_batch_size: 1024,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
