use thiserror::Error;

/// Errors returned by a [`crate::store::Store`] driver (spec §4.1).
///
/// This is deliberately a smaller taxonomy than [`itemstore_core::ItemError`]:
/// drivers only ever need to report that a key is missing, that the backend
/// itself misbehaved, that (de)serializing the stored envelope failed, or
/// that the session has been closed. The item service and HTTP layer widen
/// this into the full error-kind taxonomy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("backend throttled: {0}")]
    Throttled(String),

    #[error("encode failure: {0}")]
    Encode(String),

    #[error("decode failure: {0}")]
    Decode(String),

    #[error("server closed")]
    ServerClosed,
}
