//! TTL Cleanup Task
//!
//! Background reaper that periodically removes expired cache entries, so
//! entries that are never read again still release their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::metrics::ServerMetrics;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between sweeps.
/// Each shard is swept in batches of `batch_size` slots, releasing the shard
/// lock between batches and yielding to the runtime after each batch.
///
/// # Arguments
/// * `cache` - Shared cache engine
/// * `interval` - Time between cleanup runs
/// * `batch_size` - Arena slots examined per lock hold
/// * `metrics` - Receives the number of reaped entries
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown. Stopping the reaper only delays memory
/// reclamation; reads still never see expired entries.
pub fn spawn_cleanup_task(
    cache: Arc<CacheStore>,
    interval: Duration,
    batch_size: usize,
    metrics: Arc<ServerMetrics>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {}ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut removed = 0;
            for shard in 0..cache.shard_count() {
                let mut cursor = Some(0);
                while let Some(start) = cursor {
                    let (count, next) = cache.cleanup_step(shard, start, batch_size);
                    removed += count;
                    cursor = next;
                    tokio::task::yield_now().await;
                }
            }
            metrics.record_reaped(removed);

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, DEFAULT_CLEANUP_BATCH};

    fn store() -> Arc<CacheStore> {
        Arc::new(CacheStore::new(100).unwrap())
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = store();
        let metrics = Arc::new(ServerMetrics::new());

        cache.set("expire_soon", "value", Some(Duration::from_millis(50)));

        let handle = spawn_cleanup_task(
            cache.clone(),
            Duration::from_millis(100),
            DEFAULT_CLEANUP_BATCH,
            metrics.clone(),
        );

        // Wait for entry to expire and cleanup to run
        tokio::time::sleep(Duration::from_millis(400)).await;

        // Removed physically, not just hidden by lazy expiration
        assert_eq!(cache.len(), 0, "Expired entry should have been cleaned up");
        assert_eq!(metrics.snapshot().reaped, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = store();

        cache.set("long_lived", "value", Some(Duration::from_secs(3600)));
        cache.set("forever", "value", None);

        let handle = spawn_cleanup_task(
            cache.clone(),
            Duration::from_millis(50),
            DEFAULT_CLEANUP_BATCH,
            Arc::new(ServerMetrics::new()),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(&cache.get("long_lived").unwrap()[..], b"value");

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps_single_shard_in_small_batches() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = Arc::new(CacheStore::with_options(1_000, 1, clock.clone()).unwrap());
        let metrics = Arc::new(ServerMetrics::new());

        for i in 0..500 {
            cache.set(&format!("k{}", i), "v", Some(Duration::from_millis(5)));
        }
        cache.set("keep", "v", None);
        clock.advance_ms(5);

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20), 8, metrics.clone());

        // Other tasks on the runtime keep making progress during the sweep
        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("keep").is_some() })
        };
        assert!(reader.await.unwrap());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(metrics.snapshot().reaped, 500);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(
            store(),
            Duration::from_secs(1),
            DEFAULT_CLEANUP_BATCH,
            Arc::new(ServerMetrics::new()),
        );

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
