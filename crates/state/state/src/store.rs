use std::collections::HashMap;

use async_trait::async_trait;

use itemstore_core::{Item, ItemKey};

use crate::error::StoreError;

/// The six-operation backend driver contract (spec §4.1).
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Get/Delete on a missing or expired key return [`StoreError::NotFound`].
/// GetAll returns a snapshot with expired entries already filtered out —
/// backends MAY take that snapshot point-in-time or read-committed across
/// multiple internal scans; callers tolerate either.
#[async_trait]
pub trait Store: Send + Sync {
    /// Upsert. TTL semantics apply regardless of prior existence at `key`.
    async fn push(&self, key: &ItemKey, item: Item) -> Result<(), StoreError>;

    /// Fetch the live item at `key`, or [`StoreError::NotFound`] if missing
    /// or expired.
    async fn get(&self, key: &ItemKey) -> Result<Item, StoreError>;

    /// Delete the item at `key` and return the deleted copy, or
    /// [`StoreError::NotFound`] if it was already missing or expired.
    async fn delete(&self, key: &ItemKey) -> Result<Item, StoreError>;

    /// Snapshot of every live item in `bucket`, keyed by id.
    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, Item>, StoreError>;

    /// Cheap, side-effect-free liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release backend resources. Called exactly once during shutdown.
    async fn close(&self) -> Result<(), StoreError>;
}
