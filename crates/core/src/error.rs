use thiserror::Error;

use crate::key::ItemKey;

/// Backend-agnostic error classification (spec §7). Every error surfaced
/// above the driver layer collapses to exactly one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    BadBucket,
    BadId,
    BadOwner,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    BackendUnavailable,
    BackendThrottled,
    EncodeFailure,
    DecodeFailure,
    Internal,
}

/// An error from validation, the item service, or a backend driver, carrying
/// the offending key and operation where applicable.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid bucket name: {0}")]
    BadBucket(String),

    #[error("invalid item id: {0}")]
    BadId(String),

    #[error("invalid owner: {0}")]
    BadOwner(String),

    #[error("forbidden: owner mismatch on {key} during {op}")]
    Forbidden { key: ItemKey, op: &'static str },

    #[error("not found: {key} during {op}")]
    NotFound { key: ItemKey, op: &'static str },

    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("backend unavailable during {op} on {key:?}: {source}")]
    BackendUnavailable {
        key: Option<ItemKey>,
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("backend throttled during {op} on {key:?}")]
    BackendThrottled {
        key: Option<ItemKey>,
        op: &'static str,
    },

    #[error("encode failure during {op} on {key}: {source}")]
    EncodeFailure {
        key: ItemKey,
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("decode failure during {op} on {key:?}: {source}")]
    DecodeFailure {
        key: Option<ItemKey>,
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ItemError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::BadBucket(_) => ErrorKind::BadBucket,
            Self::BadId(_) => ErrorKind::BadId,
            Self::BadOwner(_) => ErrorKind::BadOwner,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::BackendThrottled { .. } => ErrorKind::BackendThrottled,
            Self::EncodeFailure { .. } => ErrorKind::EncodeFailure,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
