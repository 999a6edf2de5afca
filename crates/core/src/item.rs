use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored item: the full internal record, including the owner secret and
/// the derived absolute expiry. Never serialized directly to an HTTP client —
/// see [`ItemEnvelope`] for the wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// 64-character lowercase hex identifier; primary key within a bucket.
    pub id: String,
    /// Opaque JSON payload. The store never interprets it.
    pub data: serde_json::Value,
    /// Configured TTL in seconds as last set by a Push. `0` means "never expires".
    pub ttl: u64,
    /// Owner secret bound at creation. Empty string is a legal, distinct owner.
    #[serde(default)]
    pub owner: String,
    /// Absolute deadline derived from `ttl` at write time. `None` when `ttl == 0`.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Item {
    #[must_use]
    pub fn new(id: impl Into<String>, data: serde_json::Value, ttl: u64, owner: impl Into<String>) -> Self {
        let id = id.into();
        let owner = owner.into();
        let expires_at = Self::expiry_from_ttl(ttl);
        Self {
            id,
            data,
            ttl,
            owner,
            expires_at,
        }
    }

    /// Compute the absolute expiry timestamp from a TTL in seconds, anchored to now.
    #[must_use]
    pub fn expiry_from_ttl(ttl: u64) -> Option<DateTime<Utc>> {
        if ttl == 0 {
            None
        } else {
            Some(Utc::now() + chrono::Duration::seconds(i64::try_from(ttl).unwrap_or(i64::MAX)))
        }
    }

    /// `true` if `expires_at` is in the past. Items that are expired MUST NOT
    /// be observed by Get/GetAll (invariant 2).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Utc::now() >= deadline)
    }

    /// Seconds remaining until expiry, clamped to zero; `0` for non-expiring items.
    #[must_use]
    pub fn remaining_ttl(&self) -> u64 {
        match self.expires_at {
            None => 0,
            Some(deadline) => {
                let remaining = (deadline - Utc::now()).num_seconds();
                u64::try_from(remaining.max(0)).unwrap_or(0)
            }
        }
    }

    /// Project this record into the client-facing envelope, scrubbing `owner`.
    #[must_use]
    pub fn to_envelope(&self) -> ItemEnvelope {
        ItemEnvelope {
            id: self.id.clone(),
            data: self.data.clone(),
            ttl: self.remaining_ttl(),
        }
    }
}

/// Wire representation of an item: what PUT accepts and GET/GetAll return.
/// Deliberately excludes `owner` — it is a secret, never echoed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemEnvelope {
    pub id: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: serde_json::Value,
    /// Remaining seconds until expiry on read; requested TTL (pre-clamp) on write.
    #[serde(default)]
    pub ttl: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_sets_expiry_when_ttl_nonzero() {
        let item = Item::new("abc", serde_json::json!({"a": 1}), 300, "owner-1");
        assert!(item.expires_at.is_some());
        assert!(!item.is_expired());
        assert!(item.remaining_ttl() <= 300);
    }

    #[test]
    fn zero_ttl_never_expires() {
        let item = Item::new("abc", serde_json::Value::Null, 0, "");
        assert!(item.expires_at.is_none());
        assert!(!item.is_expired());
        assert_eq!(item.remaining_ttl(), 0);
    }

    #[test]
    fn envelope_omits_owner() {
        let item = Item::new("abc", serde_json::json!({"x": true}), 0, "secret-owner");
        let envelope = item.to_envelope();
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("owner").is_none());
        assert_eq!(value["id"], "abc");
    }
}
