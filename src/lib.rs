//! Mini Cache - an in-process key/value cache engine
//!
//! Bounded capacity with LRU eviction, per-entry TTL expiration (lazy on read
//! plus a background reaper), safe for concurrent use. Ships with a small HTTP
//! front end.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, CacheStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use metrics::ServerMetrics;
pub use tasks::spawn_cleanup_task;
