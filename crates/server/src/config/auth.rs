use serde::Deserialize;

/// `[auth]` section: Basic auth credential list plus the JWT/capability pipeline.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Base64-encoded `user:password` strings permitted for Basic auth.
    pub auth_header: Vec<String>,
    pub jwt: JwtConfig,
    pub capability_check: CapabilityCheckConfig,
    /// Capability string granting super-user access.
    pub super_user_capability: String,
    /// Dot-separated path to the capability array within JWT claims.
    pub capability_list_claim_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            auth_header: Vec::new(),
            jwt: JwtConfig::default(),
            capability_check: CapabilityCheckConfig::default(),
            super_user_capability: String::from("midt:super"),
            capability_list_claim_path: String::from("capabilities"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Per-claim (`nbf`/`exp`) time buffer, seconds.
    pub leeway_seconds: u64,
    /// `kid` used when a token omits the header or names an unknown key.
    pub default_kid: Option<String>,
    pub keys: Vec<JwtKeyConfig>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            leeway_seconds: 60,
            default_kid: None,
            keys: Vec::new(),
        }
    }
}

/// One statically-configured signing key.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtKeyConfig {
    pub kid: String,
    /// `"HS256"` or `"RS256"`.
    pub algorithm: String,
    /// HS256: the shared secret, plain text. RS256: PEM-encoded public key.
    pub material: String,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "lowercase")]
pub struct CapabilityCheckConfig {
    /// `"enforce"`, `"monitor"`, or `"none"` (disabled).
    pub mode: String,
    /// Regex list of endpoints the capability check applies to.
    pub endpoint_buckets: Vec<String>,
}

impl Default for CapabilityCheckConfig {
    fn default() -> Self {
        Self {
            mode: String::from("none"),
            endpoint_buckets: Vec::new(),
        }
    }
}
