use std::collections::HashMap;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::config::JwtKeyConfig;

/// Signing key material plus the algorithm it was configured for.
struct KeyMaterial {
    key: DecodingKey,
    algorithm: Algorithm,
}

/// Resolves a `kid` (JWT header claim) to decoding key material.
///
/// A static, config-built table today; the trait boundary lets a production
/// deployment later swap in a JWKS-fetching resolver without touching the
/// validation pipeline above it.
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, kid: Option<&str>) -> Option<(DecodingKey, Algorithm)>;
}

pub struct StaticKeyResolver {
    keys: HashMap<String, KeyMaterial>,
    default_kid: Option<String>,
}

impl StaticKeyResolver {
    /// # Errors
    /// Returns an error if a key's algorithm is unrecognized or its material
    /// (secret / PEM) fails to parse.
    pub fn from_config(keys: &[JwtKeyConfig], default_kid: Option<String>) -> Result<Self, String> {
        let mut table = HashMap::new();
        for entry in keys {
            let (key, algorithm) = match entry.algorithm.as_str() {
                "HS256" => (
                    DecodingKey::from_secret(entry.material.as_bytes()),
                    Algorithm::HS256,
                ),
                "RS256" => {
                    let key = DecodingKey::from_rsa_pem(entry.material.as_bytes())
                        .map_err(|e| format!("invalid RS256 key for kid '{}': {e}", entry.kid))?;
                    (key, Algorithm::RS256)
                }
                other => return Err(format!("unsupported JWT algorithm '{other}'")),
            };
            table.insert(entry.kid.clone(), KeyMaterial { key, algorithm });
        }
        Ok(Self {
            keys: table,
            default_kid,
        })
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve(&self, kid: Option<&str>) -> Option<(DecodingKey, Algorithm)> {
        let kid = kid.or(self.default_kid.as_deref())?;
        let material = self.keys.get(kid)?;
        Some((material.key.clone(), material.algorithm))
    }
}

/// Minimal header shape, enough to read `kid` before full validation.
#[derive(Deserialize)]
struct UnverifiedHeader {
    kid: Option<String>,
}

/// Claims this pipeline cares about; anything else in the token is ignored.
#[derive(Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Validate `token`'s signature and standard time claims, returning the
/// decoded claims on success.
///
/// # Errors
/// Returns an error describing why validation failed (unknown `kid`,
/// signature mismatch, expired/not-yet-valid token, missing `sub`).
pub fn validate_token(
    token: &str,
    resolver: &dyn KeyResolver,
    leeway_seconds: u64,
) -> Result<Claims, String> {
    let header = jsonwebtoken::decode_header(token).map_err(|e| format!("malformed token: {e}"))?;
    let (key, algorithm) = resolver
        .resolve(header.kid.as_deref())
        .ok_or_else(|| "no signing key for token kid".to_owned())?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = leeway_seconds;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| format!("invalid token: {e}"))?;
    if data.claims.sub.is_empty() {
        return Err("token 'sub' claim is empty".to_owned());
    }
    Ok(data.claims)
}

/// Pull a capability array out of the claims at a dot-separated nested path
/// (e.g. `"bascule.capabilities"`), defaulting to the top-level `capabilities`
/// field when the path is just `"capabilities"`.
#[must_use]
pub fn capabilities_at_path(claims: &Claims, path: &str) -> Vec<String> {
    if path == "capabilities" {
        return claims.capabilities.clone().unwrap_or_default();
    }

    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Vec::new();
    };
    let Some(mut value) = claims.extra.get(first) else {
        return Vec::new();
    };
    for segment in segments {
        let Some(next) = value.get(segment) else {
            return Vec::new();
        };
        value = next;
    }
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_with_capabilities(secret: &str, kid: &str, capabilities: &[&str]) -> String {
        #[derive(serde::Serialize)]
        struct RawClaims<'a> {
            sub: &'a str,
            capabilities: &'a [&'a str],
            exp: u64,
        }
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(kid.to_owned());
        encode(
            &header,
            &RawClaims {
                sub: "user-1",
                capabilities,
                exp: (chrono::Utc::now().timestamp() + 3600) as u64,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn resolves_capabilities_from_top_level_claim() {
        let secret = "shared-secret";
        let resolver = StaticKeyResolver::from_config(
            &[JwtKeyConfig {
                kid: "key-1".into(),
                algorithm: "HS256".into(),
                material: secret.into(),
            }],
            None,
        )
        .unwrap();
        let token = token_with_capabilities(secret, "key-1", &["midt:super"]);

        let claims = validate_token(&token, &resolver, 60).unwrap();
        let caps = capabilities_at_path(&claims, "capabilities");
        assert_eq!(caps, vec!["midt:super".to_owned()]);
    }

    #[test]
    fn unknown_kid_is_rejected() {
        let resolver = StaticKeyResolver::from_config(&[], None).unwrap();
        let token = token_with_capabilities("secret", "missing-kid", &[]);
        assert!(validate_token(&token, &resolver, 60).is_err());
    }
}
