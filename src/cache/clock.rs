//! Clock Module
//!
//! Time source for entry timestamps and TTL checks, in Unix milliseconds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// == Clock Trait ==
/// Source of the current time used by the cache engine.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current Unix timestamp in milliseconds.
    fn now_ms(&self) -> u64;
}

// == System Clock ==
/// Unix-millisecond clock that advances with the monotonic clock.
///
/// The wall clock is read once at construction; after that readings move
/// only by elapsed `Instant` time, so wall clock steps (NTP corrections,
/// manual changes) never shorten or revive a live TTL.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    base_unix_ms: u64,
    base: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            base_unix_ms: current_timestamp_ms(),
            base: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.base.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.base_unix_ms.saturating_add(elapsed)
    }
}

// == Manual Clock ==
/// Clock that only moves when told to. Used to test TTL behavior without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute timestamp.
    pub fn set_ms(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A system clock set before the epoch reads as 0 rather than panicking.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
