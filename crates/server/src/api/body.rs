use axum::extract::{FromRequest, Json, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse as _;
use serde::de::DeserializeOwned;

use itemstore_core::ItemError;

use crate::error::HttpError;

/// `Json<T>` extractor whose rejection is translated into the shared error
/// taxonomy instead of axum's default plain-text body, so an oversize
/// request (rejected by the `DefaultBodyLimit` layer before this extractor
/// ever runs) surfaces as the sanitized 413 response rather than axum's own.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_length = req
            .headers()
            .get(axum::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = rejection.to_string();
                let status = rejection.into_response().status();
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    Err(HttpError::from(ItemError::PayloadTooLarge(content_length)))
                } else {
                    Err(HttpError::from(ItemError::BadRequest(message)))
                }
            }
        }
    }
}
