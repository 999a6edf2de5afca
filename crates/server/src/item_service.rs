use std::sync::Arc;

use serde::Deserialize;

use itemstore_core::{InputValidation, Item, ItemEnvelope, ItemError, ItemKey, validate_bucket, validate_id, validate_owner};
use itemstore_store::{StoreError, StoreFacade};

/// Body accepted by `PUT /store/{bucket}/{id}`.
#[derive(Debug, Deserialize)]
pub struct PutRequest {
    pub id: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// Outcome of a [`ItemService::put`]: the stored envelope and whether a new
/// row was created (201) or an existing one replaced (200).
pub struct PutOutcome {
    pub envelope: ItemEnvelope,
    pub created: bool,
}

/// Validates input, enforces owner-secret scoping, and applies TTL defaulting
/// on top of a [`StoreFacade`].
pub struct ItemService {
    store: Arc<StoreFacade>,
    validation: InputValidation,
    item_max_ttl: u64,
}

impl ItemService {
    #[must_use]
    pub fn new(store: Arc<StoreFacade>, validation: InputValidation, item_max_ttl: u64) -> Self {
        Self {
            store,
            validation,
            item_max_ttl,
        }
    }

    pub async fn put(
        &self,
        bucket: &str,
        id: &str,
        body: PutRequest,
        owner_header: &str,
        is_super_user: bool,
    ) -> Result<PutOutcome, ItemError> {
        validate_bucket(&self.validation, bucket)?;
        validate_id(id)?;
        validate_owner(&self.validation, owner_header)?;
        if body.id != id {
            return Err(ItemError::BadRequest(format!(
                "body id '{}' does not match URL id '{id}'",
                body.id
            )));
        }

        let key = ItemKey::new(bucket, id);
        let ttl = body.ttl.unwrap_or(self.item_max_ttl).min(self.item_max_ttl);

        let existing = match self.store.get(&key).await {
            Ok(item) => Some(item),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(map_store_error(err, &key, "put")),
        };

        let owner = match &existing {
            None => owner_header.to_owned(),
            Some(stored) if is_super_user => stored.owner.clone(),
            Some(stored) if stored.owner == owner_header => stored.owner.clone(),
            Some(_) => {
                return Err(ItemError::Forbidden { key, op: "put" });
            }
        };

        let item = Item::new(id, body.data, ttl, owner);
        let envelope = item.to_envelope();
        self.store
            .push(&key, item)
            .await
            .map_err(|e| map_store_error(e, &key, "put"))?;

        Ok(PutOutcome {
            envelope,
            created: existing.is_none(),
        })
    }

    pub async fn get(
        &self,
        bucket: &str,
        id: &str,
        owner_header: &str,
        is_super_user: bool,
    ) -> Result<ItemEnvelope, ItemError> {
        validate_bucket(&self.validation, bucket)?;
        validate_id(id)?;

        let key = ItemKey::new(bucket, id);
        let item = self
            .store
            .get(&key)
            .await
            .map_err(|e| map_store_error(e, &key, "get"))?;

        // Ownership mismatch on observation never produces forbidden, only
        // not-found, so existence cannot be inferred from the response.
        if !is_super_user && item.owner != owner_header {
            return Err(ItemError::NotFound { key, op: "get" });
        }
        Ok(item.to_envelope())
    }

    pub async fn delete(
        &self,
        bucket: &str,
        id: &str,
        owner_header: &str,
        is_super_user: bool,
    ) -> Result<ItemEnvelope, ItemError> {
        validate_bucket(&self.validation, bucket)?;
        validate_id(id)?;

        let key = ItemKey::new(bucket, id);

        // Peek first so an owner mismatch reports not-found without deleting
        // someone else's item.
        let item = self
            .store
            .get(&key)
            .await
            .map_err(|e| map_store_error(e, &key, "delete"))?;
        if !is_super_user && item.owner != owner_header {
            return Err(ItemError::NotFound { key, op: "delete" });
        }

        let deleted = self
            .store
            .delete(&key)
            .await
            .map_err(|e| map_store_error(e, &key, "delete"))?;
        Ok(deleted.to_envelope())
    }

    pub async fn get_all(
        &self,
        bucket: &str,
        owner_header: &str,
        is_super_user: bool,
    ) -> Result<Vec<ItemEnvelope>, ItemError> {
        validate_bucket(&self.validation, bucket)?;

        let items = self
            .store
            .get_all(bucket)
            .await
            .map_err(|e| map_store_error(e, &ItemKey::new(bucket, ""), "get_all"))?;

        let envelopes = items
            .into_values()
            .filter(|item| is_super_user || item.owner == owner_header)
            .map(|item| item.to_envelope())
            .collect();
        Ok(envelopes)
    }
}

/// Translate a backend-level [`StoreError`] into the shared [`ItemError`] taxonomy.
fn map_store_error(err: StoreError, key: &ItemKey, op: &'static str) -> ItemError {
    match err {
        StoreError::NotFound(_) => ItemError::NotFound {
            key: key.clone(),
            op,
        },
        StoreError::Backend(msg) => ItemError::BackendUnavailable {
            key: Some(key.clone()),
            op,
            source: msg.into(),
        },
        StoreError::Throttled(_) => ItemError::BackendThrottled {
            key: Some(key.clone()),
            op,
        },
        StoreError::Encode(msg) => ItemError::EncodeFailure {
            key: key.clone(),
            op,
            source: msg.into(),
        },
        StoreError::Decode(msg) => ItemError::DecodeFailure {
            key: Some(key.clone()),
            op,
            source: msg.into(),
        },
        StoreError::ServerClosed => ItemError::BackendUnavailable {
            key: Some(key.clone()),
            op,
            source: "store is closed".into(),
        },
    }
}
