/// Configuration for the CQL-style wide-column backend (ScyllaDB/Cassandra).
#[derive(Debug, Clone)]
pub struct CqlConfig {
    /// Contact points, e.g. `["127.0.0.1:9042"]`.
    pub known_nodes: Vec<String>,

    /// Keyspace holding the item table. Created if absent.
    pub keyspace: String,

    /// Table name within `keyspace` (default `items`).
    pub table: String,

    /// Replication factor used when creating the keyspace.
    pub replication_factor: u32,

    /// Number of connection attempts before surfacing a backend error.
    pub connect_retries: u32,

    /// Base delay for the multiplicative connect backoff.
    pub connect_backoff_base_ms: u64,
}

impl Default for CqlConfig {
    fn default() -> Self {
        Self {
            known_nodes: vec![String::from("127.0.0.1:9042")],
            keyspace: String::from("itemstore"),
            table: String::from("items"),
            replication_factor: 1,
            connect_retries: 5,
            connect_backoff_base_ms: 200,
        }
    }
}

impl CqlConfig {
    #[must_use]
    pub(crate) fn qualified_table(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = CqlConfig::default();
        assert_eq!(cfg.keyspace, "itemstore");
        assert_eq!(cfg.table, "items");
        assert_eq!(cfg.qualified_table(), "itemstore.items");
    }

    #[test]
    fn custom_keyspace() {
        let cfg = CqlConfig {
            keyspace: "custom_ks".into(),
            ..CqlConfig::default()
        };
        assert_eq!(cfg.qualified_table(), "custom_ks.items");
    }
}
