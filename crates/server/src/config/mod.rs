mod api;
mod auth;
mod server;
mod store;
mod validation;


pub use api::ApiConfig;
pub use auth::{AuthConfig, CapabilityCheckConfig, JwtConfig, JwtKeyConfig};
pub use server::ServerConfig;
pub use store::{CqlBackendConfig, DynamoBackendConfig, StoreConfig};
pub use validation::{OwnerLengthConfig, UserInputValidationConfig};

use serde::Deserialize;

/// Top-level configuration for the item store server, loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ItemStoreConfig {
    pub store: StoreConfig,
    pub user_input_validation: UserInputValidationConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

impl Default for ItemStoreConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            user_input_validation: UserInputValidationConfig::default(),
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl ItemStoreConfig {
    /// Load from a TOML file at `path`, or fall back to all-defaults (in-memory
    /// backend, auth disabled) when the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read config at {}: {e}", path.display()))?;
            toml::from_str(&contents).map_err(|e| format!("failed to parse config: {e}"))
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }
}
