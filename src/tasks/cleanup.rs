//! TTL Cleanup Task
//!
//! Background task that periodically purges expired cache entries so memory
//! does not wait on reads to reclaim them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that purges expired entries every `interval`.
///
/// The returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::new(1000, 300)));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut cache_guard = cache.write().await;
                let removed = cache_guard.cleanup_expired();
                (removed, cache_guard.len())
            };

            if removed > 0 {
                info!(
                    "TTL cleanup: removed {} expired entries, {} remaining",
                    removed, remaining
                );
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use serde_json::json;

    const TICK: Duration = Duration::from_millis(50);

    fn shared_store() -> (Arc<RwLock<CacheStore>>, ManualClock) {
        let clock = ManualClock::starting_at(0);
        let store = CacheStore::new(100, 300).with_clock(Arc::new(clock.clone()));
        (Arc::new(RwLock::new(store)), clock)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let (cache, clock) = shared_store();
        cache
            .write()
            .await
            .set("expire_soon", json!("value"), Some(1), "theme")
            .unwrap();

        clock.advance_secs(2);
        let handle = spawn_cleanup_task(cache.clone(), TICK);
        tokio::time::sleep(TICK * 4).await;

        {
            let cache_guard = cache.read().await;
            assert!(cache_guard.is_empty(), "Expired entry should have been purged");
            assert_eq!(cache_guard.metrics().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let (cache, clock) = shared_store();
        cache
            .write()
            .await
            .set("long_lived", json!("value"), Some(3600), "theme")
            .unwrap();

        clock.advance_secs(60);
        let handle = spawn_cleanup_task(cache.clone(), TICK);
        tokio::time::sleep(TICK * 4).await;

        assert_eq!(
            cache.write().await.get("long_lived", "theme"),
            Some(json!("value"))
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (cache, _) = shared_store();
        let handle = spawn_cleanup_task(cache, TICK);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
