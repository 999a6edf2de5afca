use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;

use itemstore_core::{Item, ItemKey};
use itemstore_store::{Store, StoreError};

use crate::config::DynamoConfig;

/// Translate an AWS SDK error into the shared taxonomy: throughput-exceeded
/// and general throttling exceptions become [`StoreError::Throttled`] (429
/// at the HTTP layer); anything else is [`StoreError::Backend`] (503).
fn map_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata,
{
    let throttled = err
        .as_service_error()
        .and_then(ProvideErrorMetadata::code)
        .is_some_and(|code| {
            code == "ProvisionedThroughputExceededException" || code == "ThrottlingException"
        });
    if throttled {
        StoreError::Throttled(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

/// Build a `DynamoDB` client from the ambient AWS configuration, honoring a
/// configured custom endpoint (e.g. `DynamoDB` Local) when set.
pub async fn build_client(config: &DynamoConfig) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
    }
    let shared_config = loader.load().await;

    let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared_config);
    if let Some(endpoint) = &config.endpoint_url {
        builder = builder.endpoint_url(endpoint);
    }
    Client::from_conf(builder.build())
}

/// `DynamoDB`-backed implementation of [`Store`].
///
/// Schema: hash key `bucket`, range key `id`, plus `data` (the item's opaque
/// payload, JSON-encoded), `owner`, `ttl` (as last configured), and `expires`
/// (absolute epoch seconds, `0` meaning "never"). Native TTL deletion is
/// eventually consistent, so every read path additionally filters
/// `expires <= now` itself and treats a stale row as not-found.
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    #[must_use]
    pub fn new(client: Client, config: &DynamoConfig) -> Self {
        Self {
            client,
            table_name: config.table_name.clone(),
        }
    }

    fn item_to_attrs(key: &ItemKey, item: &Item) -> HashMap<String, AttributeValue> {
        let mut attrs = HashMap::new();
        attrs.insert("bucket".to_owned(), AttributeValue::S(key.bucket.clone()));
        attrs.insert("id".to_owned(), AttributeValue::S(key.id.clone()));
        attrs.insert(
            "data".to_owned(),
            AttributeValue::S(item.data.to_string()),
        );
        attrs.insert("owner".to_owned(), AttributeValue::S(item.owner.clone()));
        attrs.insert("ttl".to_owned(), AttributeValue::N(item.ttl.to_string()));
        let expires = item
            .expires_at
            .map(|d| d.timestamp())
            .unwrap_or(0);
        attrs.insert("expires".to_owned(), AttributeValue::N(expires.to_string()));
        attrs
    }

    fn attrs_to_item(
        key: &ItemKey,
        attrs: &HashMap<String, AttributeValue>,
    ) -> Result<Item, StoreError> {
        let data_str = attrs
            .get("data")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| StoreError::Decode(format!("{}: missing data attribute", key.canonical())))?;
        let data = serde_json::from_str(data_str)
            .map_err(|e| StoreError::Decode(format!("{}: {e}", key.canonical())))?;
        let owner = attrs
            .get("owner")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();
        let ttl = attrs
            .get("ttl")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);
        let expires = attrs
            .get("expires")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);
        let expires_at = if expires > 0 {
            chrono::DateTime::from_timestamp(expires, 0)
        } else {
            None
        };

        Ok(Item {
            id: key.id.clone(),
            data,
            ttl,
            owner,
            expires_at,
        })
    }

    /// `true` if the row's `expires` attribute denotes a past deadline.
    fn is_expired(attrs: &HashMap<String, AttributeValue>) -> bool {
        let expires = attrs
            .get("expires")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<i64>().ok())
            .unwrap_or(0);
        expires > 0 && expires <= chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl Store for DynamoStore {
    async fn push(&self, key: &ItemKey, item: Item) -> Result<(), StoreError> {
        let attrs = Self::item_to_attrs(key, &item);
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(attrs))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> Result<Item, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("bucket", AttributeValue::S(key.bucket.clone()))
            .key("id", AttributeValue::S(key.id.clone()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        match result.item {
            Some(attrs) if !Self::is_expired(&attrs) => Self::attrs_to_item(key, &attrs),
            _ => Err(StoreError::NotFound(key.canonical())),
        }
    }

    async fn delete(&self, key: &ItemKey) -> Result<Item, StoreError> {
        // Read first so a delete of a missing/expired row reports not-found
        // rather than silently "succeeding".
        let item = self.get(key).await?;

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("bucket", AttributeValue::S(key.bucket.clone()))
            .key("id", AttributeValue::S(key.id.clone()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(item)
    }

    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, Item>, StoreError> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("bucket = :b")
            .expression_attribute_values(":b", AttributeValue::S(bucket.to_owned()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let mut out = HashMap::new();
        for attrs in result.items.unwrap_or_default() {
            if Self::is_expired(&attrs) {
                continue;
            }
            let id = attrs
                .get("id")
                .and_then(|v| v.as_s().ok())
                .cloned()
                .ok_or_else(|| StoreError::Decode(format!("bucket {bucket}: row missing id")))?;
            let key = ItemKey::new(bucket, id.clone());
            let item = Self::attrs_to_item(&key, &attrs)?;
            out.insert(id, item);
        }
        Ok(out)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map(|_| ())
            .map_err(map_sdk_error)
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
