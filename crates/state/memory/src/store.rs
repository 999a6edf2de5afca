use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use itemstore_core::{Item, ItemKey};
use itemstore_store::{Store, StoreError};

/// Reference [`Store`] implementation: a single reader/writer lock guarding
/// `bucket -> id -> Item`.
///
/// Readers (`get`, `get_all`) take shared access; writers (`push`, `delete`,
/// and the lazy reap that both `get` and `delete` perform on an expired
/// entry) take exclusive access. `get_all` filters expired entries without
/// promoting to a write lock — the stale rows are left for the next `get`
/// or `delete` to reap.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, HashMap<String, Item>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn push(&self, key: &ItemKey, item: Item) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(key.bucket.clone())
            .or_default()
            .insert(key.id.clone(), item);
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> Result<Item, StoreError> {
        {
            let buckets = self.buckets.read().await;
            match buckets.get(&key.bucket).and_then(|b| b.get(&key.id)) {
                Some(item) if !item.is_expired() => return Ok(item.clone()),
                Some(_) => {}
                None => return Err(StoreError::NotFound(key.canonical())),
            }
        }
        // Observed an expired entry under a shared lock; reap it under an
        // exclusive one and report not-found either way.
        let mut buckets = self.buckets.write().await;
        if let Some(bucket) = buckets.get_mut(&key.bucket) {
            bucket.remove(&key.id);
        }
        Err(StoreError::NotFound(key.canonical()))
    }

    async fn delete(&self, key: &ItemKey) -> Result<Item, StoreError> {
        let mut buckets = self.buckets.write().await;
        let Some(bucket) = buckets.get_mut(&key.bucket) else {
            return Err(StoreError::NotFound(key.canonical()));
        };
        match bucket.remove(&key.id) {
            Some(item) if !item.is_expired() => Ok(item),
            _ => Err(StoreError::NotFound(key.canonical())),
        }
    }

    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, Item>, StoreError> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(bucket)
            .map(|items| {
                items
                    .iter()
                    .filter(|(_, item)| !item.is_expired())
                    .map(|(id, item)| (id.clone(), item.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryStore::new();
        itemstore_store::testing::run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn get_self_heals_expired_entry() {
        // Expiry is computed from `chrono::Utc::now()` (an absolute
        // timestamp shared with the CQL/DynamoDB backends), which tokio's
        // virtual clock under `start_paused` does not advance. A real sleep
        // past a 1-second TTL is what actually exercises the reap path.
        let store = MemoryStore::new();
        let key = ItemKey::new("planets", "a".repeat(64));
        store
            .push(&key, Item::new("a".repeat(64), serde_json::json!("x"), 1, ""))
            .await
            .unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(1100)).await;

        let err = store.get(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        // The lazy reap should have dropped the row; get_all on the bucket
        // must not see a stale entry either.
        let all = store.get_all("planets").await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn get_all_is_empty_for_unknown_bucket() {
        let store = MemoryStore::new();
        let all = store.get_all("never-touched").await.unwrap();
        assert!(all.is_empty());
    }
}
