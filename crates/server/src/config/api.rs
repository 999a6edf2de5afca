use serde::Deserialize;

/// `[api]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// URL prefix for all store routes.
    pub base: String,
    /// Maximum accepted request body size, bytes.
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base: String::from("/api/v1"),
            max_body_bytes: 1024 * 1024,
        }
    }
}
