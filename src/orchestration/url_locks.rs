//! Per-URL single-flight locks.
//!
//! Overlapping requests for the same URL queue behind one another; requests
//! for different URLs never contend. Entries are dropped once no request
//! holds or waits on them, so the map only grows with in-flight URLs.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type UrlLock = Arc<Mutex<()>>;

#[derive(Clone, Default)]
pub struct UrlLockRegistry {
    locks: Arc<DashMap<String, UrlLock>>,
}

impl UrlLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other request holds `url`
    pub async fn acquire(&self, url: &str) -> UrlGuard {
        let lock = self
            .locks
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        trace!(url = %url, "URL lock acquired");
        UrlGuard {
            url: url.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// URLs currently held or awaited
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Releases the URL lock on drop
pub struct UrlGuard {
    url: String,
    locks: Arc<DashMap<String, UrlLock>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UrlGuard {
    fn drop(&mut self) {
        // Release first so the map entry is the only remaining reference
        drop(self.guard.take());
        self.locks
            .remove_if(&self.url, |_, lock| Arc::strong_count(lock) == 1);
        trace!(url = %self.url, "URL lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let registry = UrlLockRegistry::new();
        {
            let _guard = registry.acquire("https://a.example/1").await;
            assert_eq!(registry.in_flight(), 1);
        }
        assert_eq!(registry.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_urls_do_not_contend() {
        let registry = UrlLockRegistry::new();
        let _a = registry.acquire("https://a.example/1").await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            registry.acquire("https://b.example/1"),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_url_waits_for_release() {
        let registry = UrlLockRegistry::new();
        let first = registry.acquire("https://a.example/1").await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire("https://a.example/1").await;
            })
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(registry.in_flight(), 0);
    }
}
