use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use itemstore_core::{ErrorKind, ItemError};

/// Map a domain error to its HTTP response, logging the full source chain
/// but returning only the error kind's message to the client (spec §7).
pub struct HttpError(pub ItemError);

impl From<ItemError> for HttpError {
    fn from(err: ItemError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for_kind(err.kind());

        tracing::error!(error = %err, kind = ?err.kind(), "request failed");

        let message = public_message(&err);
        let mut response = (status, axum::Json(serde_json::json!({ "error": message }))).into_response();

        if matches!(err.kind(), ErrorKind::BackendThrottled | ErrorKind::BackendUnavailable) {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, 1.into());
        }
        response
    }
}

fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest | ErrorKind::BadBucket | ErrorKind::BadId | ErrorKind::BadOwner => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::BackendThrottled => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::EncodeFailure | ErrorKind::DecodeFailure | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// User-visible message: the error kind's description only, never the
/// wrapped source (query text, backend stack traces, owner secrets).
fn public_message(err: &ItemError) -> &'static str {
    match err.kind() {
        ErrorKind::BadRequest => "bad request",
        ErrorKind::BadBucket => "invalid bucket name",
        ErrorKind::BadId => "invalid item id",
        ErrorKind::BadOwner => "invalid owner",
        ErrorKind::Forbidden => "forbidden",
        ErrorKind::NotFound => "not found",
        ErrorKind::PayloadTooLarge => "payload too large",
        ErrorKind::BackendThrottled => "backend throttled",
        ErrorKind::BackendUnavailable => "backend unavailable",
        ErrorKind::EncodeFailure => "encode failure",
        ErrorKind::DecodeFailure => "decode failure",
        ErrorKind::Internal => "internal error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemstore_core::ItemKey;

    #[test]
    fn not_found_maps_to_404() {
        let err = ItemError::NotFound {
            key: ItemKey::new("planets", "a".repeat(64)),
            op: "get",
        };
        assert_eq!(status_for_kind(err.kind()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let err = ItemError::Forbidden {
            key: ItemKey::new("planets", "a".repeat(64)),
            op: "put",
        };
        assert_eq!(status_for_kind(err.kind()), StatusCode::FORBIDDEN);
    }

    #[test]
    fn throttled_maps_to_429() {
        let err = ItemError::BackendThrottled {
            key: None,
            op: "get",
        };
        assert_eq!(status_for_kind(err.kind()), StatusCode::TOO_MANY_REQUESTS);
    }
}
