use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use itemstore_core::{Item, ItemKey};

use crate::error::StoreError;
use crate::store::Store;

/// Atomic counters tracking backend operation outcomes.
///
/// All counters use relaxed ordering; call [`snapshot`](Self::snapshot) for
/// a consistent point-in-time view.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    pub pushes: AtomicU64,
    pub push_errors: AtomicU64,
    pub gets: AtomicU64,
    pub get_misses: AtomicU64,
    pub get_errors: AtomicU64,
    pub deletes: AtomicU64,
    pub delete_misses: AtomicU64,
    pub delete_errors: AtomicU64,
    pub get_alls: AtomicU64,
    pub get_all_errors: AtomicU64,
    pub pings: AtomicU64,
    pub ping_errors: AtomicU64,
    /// Items dropped by the facade's own expiry check before reaching the caller.
    pub belt_and_braces_expirations: AtomicU64,
}

impl StoreMetrics {
    #[must_use]
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            pushes: self.pushes.load(Ordering::Relaxed),
            push_errors: self.push_errors.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            get_misses: self.get_misses.load(Ordering::Relaxed),
            get_errors: self.get_errors.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            delete_misses: self.delete_misses.load(Ordering::Relaxed),
            delete_errors: self.delete_errors.load(Ordering::Relaxed),
            get_alls: self.get_alls.load(Ordering::Relaxed),
            get_all_errors: self.get_all_errors.load(Ordering::Relaxed),
            pings: self.pings.load(Ordering::Relaxed),
            ping_errors: self.ping_errors.load(Ordering::Relaxed),
            belt_and_braces_expirations: self.belt_and_braces_expirations.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`StoreMetrics`] at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct StoreMetricsSnapshot {
    pub pushes: u64,
    pub push_errors: u64,
    pub gets: u64,
    pub get_misses: u64,
    pub get_errors: u64,
    pub deletes: u64,
    pub delete_misses: u64,
    pub delete_errors: u64,
    pub get_alls: u64,
    pub get_all_errors: u64,
    pub pings: u64,
    pub ping_errors: u64,
    pub belt_and_braces_expirations: u64,
}

/// Wraps a backend [`Store`] with operation metrics and a second,
/// belt-and-braces expiry check on every read.
///
/// Backends are expected to hide expired items from `get`/`get_all`
/// themselves; this facade re-checks `Item::is_expired` regardless, so a
/// backend bug (e.g. a clock skew on a remote node, or a missed TTL index
/// entry) degrades to a stale read rather than leaking expired data.
pub struct StoreFacade {
    inner: Arc<dyn Store>,
    metrics: StoreMetrics,
}

impl StoreFacade {
    #[must_use]
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            metrics: StoreMetrics::default(),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    pub async fn push(&self, key: &ItemKey, item: Item) -> Result<(), StoreError> {
        let result = self.inner.push(key, item).await;
        if result.is_ok() {
            self.metrics.pushes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.push_errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub async fn get(&self, key: &ItemKey) -> Result<Item, StoreError> {
        match self.inner.get(key).await {
            Ok(item) if item.is_expired() => {
                self.metrics
                    .belt_and_braces_expirations
                    .fetch_add(1, Ordering::Relaxed);
                self.metrics.get_misses.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::NotFound(key.canonical()))
            }
            Ok(item) => {
                self.metrics.gets.fetch_add(1, Ordering::Relaxed);
                Ok(item)
            }
            Err(StoreError::NotFound(k)) => {
                self.metrics.get_misses.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::NotFound(k))
            }
            Err(err) => {
                self.metrics.get_errors.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    pub async fn delete(&self, key: &ItemKey) -> Result<Item, StoreError> {
        match self.inner.delete(key).await {
            Ok(item) if item.is_expired() => {
                self.metrics
                    .belt_and_braces_expirations
                    .fetch_add(1, Ordering::Relaxed);
                self.metrics.delete_misses.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::NotFound(key.canonical()))
            }
            Ok(item) => {
                self.metrics.deletes.fetch_add(1, Ordering::Relaxed);
                Ok(item)
            }
            Err(StoreError::NotFound(k)) => {
                self.metrics.delete_misses.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::NotFound(k))
            }
            Err(err) => {
                self.metrics.delete_errors.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    pub async fn get_all(&self, bucket: &str) -> Result<HashMap<String, Item>, StoreError> {
        match self.inner.get_all(bucket).await {
            Ok(mut items) => {
                let before = items.len();
                items.retain(|_, item| !item.is_expired());
                let dropped = before - items.len();
                if dropped > 0 {
                    self.metrics
                        .belt_and_braces_expirations
                        .fetch_add(dropped as u64, Ordering::Relaxed);
                }
                self.metrics.get_alls.fetch_add(1, Ordering::Relaxed);
                Ok(items)
            }
            Err(err) => {
                self.metrics.get_all_errors.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let result = self.inner.ping().await;
        if result.is_ok() {
            self.metrics.pings.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.ping_errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        items: Mutex<HashMap<(String, String), Item>>,
    }

    #[async_trait]
    impl Store for FakeStore {
        async fn push(&self, key: &ItemKey, item: Item) -> Result<(), StoreError> {
            self.items
                .lock()
                .unwrap()
                .insert((key.bucket.clone(), key.id.clone()), item);
            Ok(())
        }

        async fn get(&self, key: &ItemKey) -> Result<Item, StoreError> {
            self.items
                .lock()
                .unwrap()
                .get(&(key.bucket.clone(), key.id.clone()))
                .cloned()
                .ok_or_else(|| StoreError::NotFound(key.canonical()))
        }

        async fn delete(&self, key: &ItemKey) -> Result<Item, StoreError> {
            self.items
                .lock()
                .unwrap()
                .remove(&(key.bucket.clone(), key.id.clone()))
                .ok_or_else(|| StoreError::NotFound(key.canonical()))
        }

        async fn get_all(&self, bucket: &str) -> Result<HashMap<String, Item>, StoreError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|((b, _), _)| b == bucket)
                .map(|((_, id), item)| (id.clone(), item.clone()))
                .collect())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn push_and_get_counts_recorded() {
        let facade = StoreFacade::new(Arc::new(FakeStore::default()));
        let key = ItemKey::new("planets", "a".repeat(64));
        facade
            .push(&key, Item::new("x", serde_json::json!(1), 0, ""))
            .await
            .unwrap();
        facade.get(&key).await.unwrap();

        let snap = facade.metrics().snapshot();
        assert_eq!(snap.pushes, 1);
        assert_eq!(snap.gets, 1);
        assert_eq!(snap.get_misses, 0);
    }

    #[tokio::test]
    async fn get_miss_is_counted_not_errored() {
        let facade = StoreFacade::new(Arc::new(FakeStore::default()));
        let key = ItemKey::new("planets", "b".repeat(64));
        let err = facade.get(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(facade.metrics().snapshot().get_misses, 1);
    }

    #[tokio::test]
    async fn belt_and_braces_hides_expired_item_on_get() {
        let facade = StoreFacade::new(Arc::new(FakeStore::default()));
        let key = ItemKey::new("planets", "c".repeat(64));
        let mut expired = Item::new("x", serde_json::json!(1), 1, "");
        expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(10));
        facade.push(&key, expired).await.unwrap();

        let err = facade.get(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(facade.metrics().snapshot().belt_and_braces_expirations, 1);
    }

    #[tokio::test]
    async fn get_all_filters_expired_entries() {
        let facade = StoreFacade::new(Arc::new(FakeStore::default()));
        let live_key = ItemKey::new("planets", "d".repeat(64));
        let dead_key = ItemKey::new("planets", "e".repeat(64));
        facade
            .push(&live_key, Item::new("d", serde_json::json!(1), 0, ""))
            .await
            .unwrap();
        let mut expired = Item::new("e", serde_json::json!(2), 1, "");
        expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(10));
        facade.push(&dead_key, expired).await.unwrap();

        let all = facade.get_all("planets").await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("d"));
        assert_eq!(facade.metrics().snapshot().belt_and_braces_expirations, 1);
    }
}
