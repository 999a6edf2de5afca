use serde::Deserialize;

/// `[store]` section: backend selector plus per-backend connection fields.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `"memory"`, `"cql"`, or `"dynamodb"`. Unrecognized or absent values fall
    /// back to `"memory"`.
    pub backend: String,
    /// Upper bound and default TTL, seconds.
    pub item_max_ttl: u64,
    /// Per-operation backend timeout, seconds.
    pub op_timeout_seconds: u64,
    pub cql: CqlBackendConfig,
    pub dynamodb: DynamoBackendConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: String::from("memory"),
            item_max_ttl: 86400,
            op_timeout_seconds: 5,
            cql: CqlBackendConfig::default(),
            dynamodb: DynamoBackendConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CqlBackendConfig {
    pub known_nodes: Vec<String>,
    pub keyspace: String,
    pub table: String,
    pub replication_factor: u32,
    pub connect_retries: u32,
    pub connect_backoff_base_ms: u64,
}

impl Default for CqlBackendConfig {
    fn default() -> Self {
        let d = itemstore_store_cql::CqlConfig::default();
        Self {
            known_nodes: d.known_nodes,
            keyspace: d.keyspace,
            table: d.table,
            replication_factor: d.replication_factor,
            connect_retries: d.connect_retries,
            connect_backoff_base_ms: d.connect_backoff_base_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DynamoBackendConfig {
    pub table_name: String,
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
}

impl Default for DynamoBackendConfig {
    fn default() -> Self {
        let d = itemstore_store_dynamodb::DynamoConfig::default();
        Self {
            table_name: d.table_name,
            endpoint_url: d.endpoint_url,
            region: d.region,
        }
    }
}
