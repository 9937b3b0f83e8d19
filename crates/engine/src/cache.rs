use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// One cached snapshot with its capture time.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

/// What a read observed.
#[derive(Debug)]
pub enum CacheRead<T> {
    /// Within the TTL.
    Fresh(Arc<CacheEntry<T>>),
    /// Past the TTL but inside the staleness-grace window; better than
    /// nothing for a read-through consumer.
    Stale(Arc<CacheEntry<T>>),
    /// Never filled, or too old even for the grace window.
    Empty,
}

/// Read-through snapshot cache for the advanced-signals collaborator.
///
/// The whole snapshot is replaced atomically (one `Arc` swap), so a reader
/// always observes a fully-old or fully-new view, never a partial one. TTL
/// and grace are constructor parameters; there is no global state.
pub struct SnapshotCache<T> {
    slot: RwLock<Option<Arc<CacheEntry<T>>>>,
    ttl: chrono::Duration,
    grace: chrono::Duration,
}

impl<T> SnapshotCache<T> {
    pub fn new(ttl: Duration, grace: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            grace: chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Swap in a new snapshot.
    pub async fn replace(&self, value: T, now: DateTime<Utc>) {
        let entry = Arc::new(CacheEntry {
            value,
            timestamp: now,
        });
        *self.slot.write().await = Some(entry);
    }

    pub async fn read(&self, now: DateTime<Utc>) -> CacheRead<T> {
        let slot = self.slot.read().await;
        let Some(entry) = slot.as_ref() else {
            return CacheRead::Empty;
        };
        let age = now.signed_duration_since(entry.timestamp);
        if age <= self.ttl {
            CacheRead::Fresh(entry.clone())
        } else if age <= self.ttl + self.grace {
            CacheRead::Stale(entry.clone())
        } else {
            CacheRead::Empty
        }
    }
}

/// Periodically rebuild the snapshot from `load` and swap it in. Runs until
/// the process exits; intended for `tokio::spawn`.
pub async fn refresh_loop<T, F>(cache: Arc<SnapshotCache<T>>, interval: Duration, mut load: F)
where
    T: Send + Sync,
    F: FnMut() -> T + Send,
{
    loop {
        let value = load();
        cache.replace(value, Utc::now()).await;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_until_first_replace() {
        let cache: SnapshotCache<Vec<u32>> =
            SnapshotCache::new(Duration::from_secs(60), Duration::from_secs(60));
        assert!(matches!(cache.read(Utc::now()).await, CacheRead::Empty));
    }

    #[tokio::test]
    async fn fresh_within_ttl_then_stale_then_empty() {
        let cache = SnapshotCache::new(Duration::from_secs(60), Duration::from_secs(120));
        let t0 = Utc::now();
        cache.replace(vec![1u32, 2], t0).await;

        let at = |secs: i64| t0 + chrono::Duration::seconds(secs);
        assert!(matches!(cache.read(at(30)).await, CacheRead::Fresh(_)));
        assert!(matches!(cache.read(at(90)).await, CacheRead::Stale(_)));
        assert!(matches!(cache.read(at(200)).await, CacheRead::Empty));
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_snapshot() {
        let cache = SnapshotCache::new(Duration::from_secs(60), Duration::from_secs(60));
        let t0 = Utc::now();
        cache.replace(vec![1u32], t0).await;
        cache.replace(vec![2u32, 3], t0).await;

        match cache.read(t0).await {
            CacheRead::Fresh(entry) => assert_eq!(entry.value, vec![2, 3]),
            other => panic!("expected fresh read, got {other:?}"),
        }
    }
}
