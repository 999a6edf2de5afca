pub mod jwt;

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;

use itemstore_core::{ItemError, ItemKey};

use crate::config::{AuthConfig, CapabilityCheckConfig};
use self::jwt::{Claims, KeyResolver, StaticKeyResolver, capabilities_at_path, validate_token};

/// Two-valued attribute derived from JWT claims: whether the caller may
/// bypass owner-scoping on reads and the owner check on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Regular,
    SuperUser,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: String,
    pub access_level: AccessLevel,
    /// Capability strings carried by a bearer token; empty for Basic auth
    /// and for the anonymous context.
    pub capabilities: Vec<String>,
}

impl AuthContext {
    #[must_use]
    pub fn is_super_user(&self) -> bool {
        self.access_level == AccessLevel::SuperUser
    }

    /// The permissive identity used when auth is disabled entirely.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            principal: String::from("anonymous"),
            access_level: AccessLevel::Regular,
            capabilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CapabilityMode {
    Enforce,
    Monitor,
    None,
}

/// Parses `Authorization` headers (Basic or Bearer/JWT) and derives an
/// [`AuthContext`], plus the orthogonal endpoint capability check.
pub struct AuthPipeline {
    basic_credentials: HashSet<(String, String)>,
    key_resolver: Box<dyn KeyResolver>,
    leeway_seconds: u64,
    super_user_capability: String,
    capability_claim_path: String,
    capability_mode: CapabilityMode,
    capability_patterns: Vec<Regex>,
}

impl AuthPipeline {
    /// # Errors
    /// Returns an error if a configured Basic credential is not valid
    /// base64/`user:password`, a JWT key fails to parse, or a capability
    /// endpoint pattern is not a valid regex.
    pub fn new(config: &AuthConfig) -> Result<Self, String> {
        let mut basic_credentials = HashSet::new();
        for encoded in &config.auth_header {
            let decoded = BASE64
                .decode(encoded)
                .map_err(|e| format!("invalid base64 in authHeader entry: {e}"))?;
            let text = String::from_utf8(decoded)
                .map_err(|e| format!("authHeader entry is not valid utf-8: {e}"))?;
            let (user, password) = text
                .split_once(':')
                .ok_or_else(|| "authHeader entry must be 'user:password'".to_owned())?;
            basic_credentials.insert((user.to_owned(), password.to_owned()));
        }

        let key_resolver = StaticKeyResolver::from_config(&config.jwt.keys, config.jwt.default_kid.clone())?;

        let capability_mode = match config.capability_check.mode.as_str() {
            "enforce" => CapabilityMode::Enforce,
            "monitor" => CapabilityMode::Monitor,
            _ => CapabilityMode::None,
        };
        let capability_patterns = config
            .capability_check
            .endpoint_buckets
            .iter()
            .map(|p| Regex::new(p).map_err(|e| format!("invalid capability endpoint pattern '{p}': {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            basic_credentials,
            key_resolver: Box::new(key_resolver),
            leeway_seconds: config.jwt.leeway_seconds,
            super_user_capability: config.super_user_capability.clone(),
            capability_claim_path: config.capability_list_claim_path.clone(),
            capability_mode,
            capability_patterns,
        })
    }

    /// Authenticate an `Authorization` header value (without the scheme's
    /// trailing content already split off).
    ///
    /// # Errors
    /// Returns [`ItemError::Forbidden`] (the taxonomy has no distinct
    /// "unauthorized" kind — see spec §7's status code list) if the header
    /// is missing, malformed, or the credentials/token do not validate.
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthContext, ItemError> {
        let header = header.ok_or_else(|| forbidden("missing Authorization header"))?;

        if let Some(encoded) = header.strip_prefix("Basic ") {
            return self.authenticate_basic(encoded);
        }
        if let Some(token) = header.strip_prefix("Bearer ") {
            return self.authenticate_bearer(token);
        }
        Err(forbidden("unsupported Authorization scheme"))
    }

    fn authenticate_basic(&self, encoded: &str) -> Result<AuthContext, ItemError> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|_| forbidden("malformed Basic credentials"))?;
        let text = String::from_utf8(decoded).map_err(|_| forbidden("malformed Basic credentials"))?;
        let (user, password) = text
            .split_once(':')
            .ok_or_else(|| forbidden("malformed Basic credentials"))?;

        if self
            .basic_credentials
            .contains(&(user.to_owned(), password.to_owned()))
        {
            Ok(AuthContext {
                principal: user.to_owned(),
                access_level: AccessLevel::Regular,
                capabilities: Vec::new(),
            })
        } else {
            Err(forbidden("invalid Basic credentials"))
        }
    }

    fn authenticate_bearer(&self, token: &str) -> Result<AuthContext, ItemError> {
        let claims: Claims = validate_token(token, self.key_resolver.as_ref(), self.leeway_seconds)
            .map_err(|e| forbidden_owned(format!("invalid bearer token: {e}")))?;

        let capabilities = capabilities_at_path(&claims, &self.capability_claim_path);
        let access_level = if capabilities.iter().any(|c| c == &self.super_user_capability) {
            AccessLevel::SuperUser
        } else {
            AccessLevel::Regular
        };

        Ok(AuthContext {
            principal: claims.sub,
            access_level,
            capabilities,
        })
    }

    /// Endpoint-authorization check, orthogonal to [`AccessLevel`]: does the
    /// caller's capability list actually authorize `method_and_path`
    /// (e.g. `"PUT:/store/{bucket}/{id}"`)?
    ///
    /// Only endpoints matching one of the configured `endpointBuckets`
    /// patterns are checked at all; everything else passes through
    /// regardless of mode. Within a covered endpoint, each of the caller's
    /// capability strings is itself treated as a regex and matched against
    /// `method_and_path` — a match means the token authorizes this request.
    /// In `enforce` mode, no matching capability rejects the request; in
    /// `monitor` mode the failure is logged but the request proceeds.
    ///
    /// # Errors
    /// Returns [`ItemError::Forbidden`] only in `enforce` mode.
    pub fn check_capability(
        &self,
        method_and_path: &str,
        capabilities: &[String],
    ) -> Result<(), ItemError> {
        if self.capability_mode == CapabilityMode::None {
            return Ok(());
        }
        let covered = self
            .capability_patterns
            .iter()
            .any(|re| re.is_match(method_and_path));
        if !covered {
            return Ok(());
        }
        let authorized = capabilities.iter().any(|capability| {
            Regex::new(capability).is_ok_and(|re| re.is_match(method_and_path))
        });
        if authorized {
            return Ok(());
        }
        match self.capability_mode {
            CapabilityMode::Enforce => Err(forbidden("capability check failed")),
            CapabilityMode::Monitor => {
                tracing::warn!(path = %method_and_path, "capability check would have failed (monitor mode)");
                Ok(())
            }
            CapabilityMode::None => Ok(()),
        }
    }
}

fn forbidden(message: &str) -> ItemError {
    forbidden_owned(message.to_owned())
}

fn forbidden_owned(message: String) -> ItemError {
    tracing::debug!(reason = %message, "authentication rejected");
    ItemError::Forbidden {
        key: ItemKey::new("", ""),
        op: "authenticate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_basic(user: &str, password: &str) -> AuthConfig {
        let encoded = BASE64.encode(format!("{user}:{password}"));
        AuthConfig {
            enabled: true,
            auth_header: vec![encoded],
            ..AuthConfig::default()
        }
    }

    #[test]
    fn basic_auth_accepts_configured_credentials() {
        let pipeline = AuthPipeline::new(&config_with_basic("alice", "hunter2")).unwrap();
        let encoded = BASE64.encode("alice:hunter2");
        let ctx = pipeline
            .authenticate(Some(&format!("Basic {encoded}")))
            .unwrap();
        assert_eq!(ctx.principal, "alice");
        assert_eq!(ctx.access_level, AccessLevel::Regular);
    }

    #[test]
    fn basic_auth_rejects_wrong_password() {
        let pipeline = AuthPipeline::new(&config_with_basic("alice", "hunter2")).unwrap();
        let encoded = BASE64.encode("alice:wrong");
        assert!(
            pipeline
                .authenticate(Some(&format!("Basic {encoded}")))
                .is_err()
        );
    }

    #[test]
    fn missing_header_is_rejected() {
        let pipeline = AuthPipeline::new(&AuthConfig::default()).unwrap();
        assert!(pipeline.authenticate(None).is_err());
    }

    fn config_with_capability_check(mode: &str) -> AuthConfig {
        AuthConfig {
            enabled: true,
            capability_check: CapabilityCheckConfig {
                mode: mode.to_owned(),
                endpoint_buckets: vec!["^PUT:/store/.*".to_owned()],
            },
            ..AuthConfig::default()
        }
    }

    #[test]
    fn capability_check_is_a_no_op_outside_covered_endpoints() {
        let pipeline = AuthPipeline::new(&config_with_capability_check("enforce")).unwrap();
        assert!(
            pipeline
                .check_capability("GET:/store/planets/abc", &[])
                .is_ok()
        );
    }

    #[test]
    fn enforce_mode_rejects_a_covered_endpoint_without_a_matching_capability() {
        let pipeline = AuthPipeline::new(&config_with_capability_check("enforce")).unwrap();
        let err = pipeline
            .check_capability("PUT:/store/planets/abc", &["other:thing".to_owned()])
            .unwrap_err();
        assert!(matches!(err, ItemError::Forbidden { .. }));
    }

    #[test]
    fn enforce_mode_allows_a_matching_capability_pattern() {
        let pipeline = AuthPipeline::new(&config_with_capability_check("enforce")).unwrap();
        assert!(
            pipeline
                .check_capability("PUT:/store/planets/abc", &["^PUT:/store/.*".to_owned()])
                .is_ok()
        );
    }

    #[test]
    fn monitor_mode_allows_through_even_without_a_matching_capability() {
        let pipeline = AuthPipeline::new(&config_with_capability_check("monitor")).unwrap();
        assert!(
            pipeline
                .check_capability("PUT:/store/planets/abc", &[])
                .is_ok()
        );
    }
}
