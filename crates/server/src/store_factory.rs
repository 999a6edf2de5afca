use std::sync::Arc;

use itemstore_store::{Store, StoreFacade};
use itemstore_store_cql::CqlStore;
use itemstore_store_dynamodb::{DynamoStore, build_client};
use itemstore_store_memory::MemoryStore;

use crate::config::StoreConfig;

/// Build the configured backend and wrap it in a [`StoreFacade`].
///
/// `backend` unrecognized or absent falls back to `"memory"` (spec §6.2).
///
/// # Errors
/// Returns an error if the selected backend fails to initialize (e.g. the
/// CQL cluster cannot be reached after its configured retries).
pub async fn create_store(config: &StoreConfig) -> Result<Arc<StoreFacade>, String> {
    let inner: Arc<dyn Store> = match config.backend.as_str() {
        "cql" => {
            let cql_config = itemstore_store_cql::CqlConfig {
                known_nodes: config.cql.known_nodes.clone(),
                keyspace: config.cql.keyspace.clone(),
                table: config.cql.table.clone(),
                replication_factor: config.cql.replication_factor,
                connect_retries: config.cql.connect_retries,
                connect_backoff_base_ms: config.cql.connect_backoff_base_ms,
            };
            let store = CqlStore::new(cql_config)
                .await
                .map_err(|e| format!("failed to initialize cql backend: {e}"))?;
            Arc::new(store)
        }
        "dynamodb" => {
            let dynamo_config = itemstore_store_dynamodb::DynamoConfig {
                table_name: config.dynamodb.table_name.clone(),
                endpoint_url: config.dynamodb.endpoint_url.clone(),
                region: config.dynamodb.region.clone(),
            };
            let client = build_client(&dynamo_config).await;
            Arc::new(DynamoStore::new(client, &dynamo_config))
        }
        other => {
            if other != "memory" {
                tracing::warn!(backend = %other, "unrecognized store backend, defaulting to memory");
            }
            Arc::new(MemoryStore::new())
        }
    };

    Ok(Arc::new(StoreFacade::new(inner)))
}

/// Provision backend schema ahead of time (the `migrate` CLI subcommand).
/// A no-op for the in-memory backend.
///
/// # Errors
/// Returns an error if schema creation fails.
pub async fn migrate(config: &StoreConfig) -> Result<(), String> {
    match config.backend.as_str() {
        "cql" => {
            create_store(config).await?;
            tracing::info!("cql schema migration complete");
            Ok(())
        }
        "dynamodb" => {
            let dynamo_config = itemstore_store_dynamodb::DynamoConfig {
                table_name: config.dynamodb.table_name.clone(),
                endpoint_url: config.dynamodb.endpoint_url.clone(),
                region: config.dynamodb.region.clone(),
            };
            let client = build_client(&dynamo_config).await;
            itemstore_store_dynamodb::create_table(&client, &dynamo_config.table_name)
                .await
                .map_err(|e| format!("failed to create dynamodb table: {e}"))?;
            itemstore_store_dynamodb::enable_ttl(&client, &dynamo_config.table_name)
                .await
                .map_err(|e| format!("failed to enable dynamodb ttl: {e}"))?;
            tracing::info!("dynamodb schema migration complete");
            Ok(())
        }
        _ => {
            tracing::info!("memory backend has no schema to migrate");
            Ok(())
        }
    }
}
