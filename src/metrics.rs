//! Server Metrics Module
//!
//! Request-level counters kept by the callers of the cache engine. The
//! engine never pushes metrics; handlers and the reaper record the outcomes
//! they observe (`get` found or not, entries evicted by `set`, entries reaped).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Server Metrics ==
/// Lock-free counters shared by request handlers and background tasks.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    reaped: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a `get`.
    pub fn record_get(&self, found: bool) {
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a `set` and the evictions it caused.
    pub fn record_set(&self, evicted: usize) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        }
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records entries removed by a cleanup sweep.
    pub fn record_reaped(&self, count: usize) {
        self.reaped.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> MetricsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_ratio = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        MetricsSnapshot {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            reaped: self.reaped.load(Ordering::Relaxed),
            hit_ratio,
        }
    }
}

// == Metrics Snapshot ==
/// Serializable copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub sets: u64,
    pub deletes: u64,
    pub reaped: u64,
    /// hits / (hits + misses), 0.0 before any request
    pub hit_ratio: f64,
}
