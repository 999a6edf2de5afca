use itemstore_core::{Item, ItemKey};

use crate::error::StoreError;
use crate::store::Store;

fn key(bucket: &str, id: &str) -> ItemKey {
    ItemKey::new(bucket, id)
}

/// Run the full store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// Each backend gets its own bucket names so a shared fixture (e.g. a
/// single Scylla keyspace reused across test runs) can't leak state
/// between conformance calls.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn Store) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_push_and_get(store).await?;
    test_push_overwrites(store).await?;
    test_delete(store).await?;
    test_delete_missing(store).await?;
    test_get_all(store).await?;
    test_get_all_empty_bucket(store).await?;
    test_ping(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn Store) -> Result<(), StoreError> {
    let err = store.get(&key("conformance-a", "missing")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

async fn test_push_and_get(store: &dyn Store) -> Result<(), StoreError> {
    let k = key("conformance-a", "push-get");
    store
        .push(&k, Item::new("push-get", serde_json::json!({"a": 1}), 0, "owner-1"))
        .await?;
    let item = store.get(&k).await?;
    assert_eq!(item.data, serde_json::json!({"a": 1}));
    assert_eq!(item.owner, "owner-1");
    Ok(())
}

async fn test_push_overwrites(store: &dyn Store) -> Result<(), StoreError> {
    let k = key("conformance-a", "overwrite");
    store
        .push(&k, Item::new("overwrite", serde_json::json!("v1"), 0, "owner-1"))
        .await?;
    store
        .push(&k, Item::new("overwrite", serde_json::json!("v2"), 0, "owner-2"))
        .await?;
    let item = store.get(&k).await?;
    assert_eq!(item.data, serde_json::json!("v2"));
    assert_eq!(item.owner, "owner-2", "push always replaces the prior owner too");
    Ok(())
}

async fn test_delete(store: &dyn Store) -> Result<(), StoreError> {
    let k = key("conformance-a", "to-delete");
    store
        .push(&k, Item::new("to-delete", serde_json::json!("bye"), 0, ""))
        .await?;
    let deleted = store.delete(&k).await?;
    assert_eq!(deleted.data, serde_json::json!("bye"));

    let err = store.get(&k).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

async fn test_delete_missing(store: &dyn Store) -> Result<(), StoreError> {
    let err = store.delete(&key("conformance-a", "never-existed")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

async fn test_get_all(store: &dyn Store) -> Result<(), StoreError> {
    let bucket = "conformance-b";
    store
        .push(&key(bucket, "one"), Item::new("one", serde_json::json!(1), 0, ""))
        .await?;
    store
        .push(&key(bucket, "two"), Item::new("two", serde_json::json!(2), 0, ""))
        .await?;

    let all = store.get_all(bucket).await?;
    assert_eq!(all.len(), 2);
    assert!(all.contains_key("one"));
    assert!(all.contains_key("two"));
    Ok(())
}

async fn test_get_all_empty_bucket(store: &dyn Store) -> Result<(), StoreError> {
    let all = store.get_all("conformance-never-touched").await?;
    assert!(all.is_empty());
    Ok(())
}

async fn test_ping(store: &dyn Store) -> Result<(), StoreError> {
    store.ping().await
}
