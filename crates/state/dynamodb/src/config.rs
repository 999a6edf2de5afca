/// Configuration for the DynamoDB backend.
#[derive(Debug, Clone)]
pub struct DynamoConfig {
    /// Table name (hash key `bucket`, range key `id`).
    pub table_name: String,

    /// Optional custom endpoint (e.g. `http://localhost:8000` for `DynamoDB` Local).
    pub endpoint_url: Option<String>,

    /// AWS region, when not picked up from the ambient environment/profile.
    pub region: Option<String>,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: String::from("itemstore_items"),
            endpoint_url: None,
            region: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = DynamoConfig::default();
        assert_eq!(cfg.table_name, "itemstore_items");
        assert!(cfg.endpoint_url.is_none());
    }
}
