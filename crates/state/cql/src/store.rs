use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use itemstore_core::{Item, ItemKey};
use itemstore_store::{Store, StoreError};

use crate::config::CqlConfig;
use crate::migrations;

/// How often the background liveness ticker pings the session.
const LIVENESS_INTERVAL: Duration = Duration::from_secs(5);

/// CQL-backed (ScyllaDB/Cassandra) implementation of [`Store`].
///
/// Stores each item as a single row keyed by `(bucket, id)` whose `data`
/// column holds the JSON-serialized [`Item`] envelope, relying on the
/// engine's own per-row TTL rather than an `expires_at` column. A background
/// task periodically pings the session so a dropped connection is detected
/// between requests rather than only on the next caller's `ping`.
pub struct CqlStore {
    session: Arc<Session>,
    config: Arc<CqlConfig>,
    closed: Arc<std::sync::atomic::AtomicBool>,
    liveness_ticker: Mutex<Option<JoinHandle<()>>>,
}

impl CqlStore {
    /// Connect to the cluster, running migrations and a bounded number of
    /// connect retries with multiplicative backoff before giving up.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] if every connect attempt fails or
    /// migrations fail to apply.
    pub async fn new(config: CqlConfig) -> Result<Self, StoreError> {
        let session = Self::connect_with_retry(&config).await?;
        migrations::run_migrations(&session, &config)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let session = Arc::new(session);
        let closed = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let ticker_session = Arc::clone(&session);
        let ticker_closed = Arc::clone(&closed);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIVENESS_INTERVAL);
            loop {
                interval.tick().await;
                if ticker_closed.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                if ticker_session.query_unpaged("SELECT now() FROM system.local", &[])
                    .await
                    .is_err()
                {
                    tracing::warn!("cql liveness ping failed");
                }
            }
        });

        Ok(Self {
            session,
            config: Arc::new(config),
            closed,
            liveness_ticker: Mutex::new(Some(ticker)),
        })
    }

    async fn connect_with_retry(config: &CqlConfig) -> Result<Session, StoreError> {
        let mut attempt = 0;
        loop {
            let result = SessionBuilder::new()
                .known_nodes(&config.known_nodes)
                .build()
                .await;
            match result {
                Ok(session) => return Ok(session),
                Err(err) if attempt + 1 < config.connect_retries => {
                    attempt += 1;
                    let backoff = config.connect_backoff_base_ms * 2u64.pow(attempt);
                    tracing::warn!(attempt, %err, "cql connect attempt failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => {
                    return Err(StoreError::Backend(format!(
                        "failed to connect to cql cluster after {} attempts: {err}",
                        attempt + 1
                    )));
                }
            }
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(std::sync::atomic::Ordering::Relaxed) {
            Err(StoreError::ServerClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for CqlStore {
    async fn push(&self, key: &ItemKey, item: Item) -> Result<(), StoreError> {
        self.ensure_open()?;
        let table = self.config.qualified_table();
        let bytes = serde_json::to_vec(&item)
            .map_err(|e| StoreError::Encode(format!("{}: {e}", key.canonical())))?;

        let query = format!("INSERT INTO {table} (bucket, id, data) VALUES (?, ?, ?) USING TTL ?");
        let ttl = i32::try_from(item.ttl).unwrap_or(i32::MAX);
        self.session
            .query_unpaged(query, (&key.bucket, &key.id, bytes, ttl))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> Result<Item, StoreError> {
        self.ensure_open()?;
        let table = self.config.qualified_table();
        let query = format!("SELECT data, TTL(data) FROM {table} WHERE bucket = ? AND id = ?");

        let rows = self
            .session
            .query_unpaged(query, (&key.bucket, &key.id))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .into_rows_result()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let Some(row) = rows
            .rows::<(Vec<u8>, Option<i32>)>()
            .map_err(|e| StoreError::Decode(e.to_string()))?
            .next()
        else {
            return Err(StoreError::NotFound(key.canonical()));
        };
        let (bytes, ttl_remaining) = row.map_err(|e| StoreError::Decode(e.to_string()))?;

        let mut item: Item = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Decode(format!("{}: {e}", key.canonical())))?;
        item.ttl = ttl_remaining.map_or(0, |t| u64::try_from(t.max(0)).unwrap_or(0));
        Ok(item)
    }

    async fn delete(&self, key: &ItemKey) -> Result<Item, StoreError> {
        self.ensure_open()?;
        // Read-then-delete: the read establishes existence so delete never
        // "succeeds" on an already-absent row.
        let item = self.get(key).await?;

        let table = self.config.qualified_table();
        let query = format!("DELETE FROM {table} WHERE bucket = ? AND id = ?");
        self.session
            .query_unpaged(query, (&key.bucket, &key.id))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(item)
    }

    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, Item>, StoreError> {
        self.ensure_open()?;
        let table = self.config.qualified_table();
        let query = format!("SELECT id, data FROM {table} WHERE bucket = ?");

        let rows = self
            .session
            .query_unpaged(query, (bucket,))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .into_rows_result()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut out = HashMap::new();
        for row in rows
            .rows::<(String, Vec<u8>)>()
            .map_err(|e| StoreError::Decode(e.to_string()))?
        {
            let (id, bytes) =
                row.map_err(|e| StoreError::Decode(format!("bucket {bucket}: {e}")))?;
            let item: Item = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Decode(format!("bucket {bucket}, id {id}: {e}")))?;
            out.insert(id, item);
        }
        Ok(out)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.session
            .query_unpaged("SELECT now() FROM system.local", &[])
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed
            .store(true, std::sync::atomic::Ordering::Relaxed);
        if let Some(ticker) = self.liveness_ticker.lock().await.take() {
            ticker.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CqlConfig {
        CqlConfig {
            known_nodes: vec![
                std::env::var("ITEMSTORE_TEST_CQL_URL")
                    .unwrap_or_else(|_| "127.0.0.1:9042".to_owned()),
            ],
            keyspace: format!("itemstore_test_{}", std::process::id()),
            ..CqlConfig::default()
        }
    }

    #[tokio::test]
    async fn conformance() {
        if std::env::var("ITEMSTORE_TEST_CQL_URL").is_err() {
            eprintln!("skipping: ITEMSTORE_TEST_CQL_URL not set");
            return;
        }
        let store = CqlStore::new(test_config())
            .await
            .expect("session creation should succeed");
        itemstore_store::testing::run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }
}
