use serde::{Deserialize, Serialize};

/// Address of an item within the store: a bucket name paired with an item id.
///
/// Unique across the whole store — no two items share a key (invariant 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub bucket: String,
    pub id: String,
}

impl ItemKey {
    #[must_use]
    pub fn new(bucket: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            id: id.into(),
        }
    }

    /// Canonical `bucket/id` representation, used in log fields and in
    /// backends that flatten the composite key into a single partition key.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}/{}", self.bucket, self.id)
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}
