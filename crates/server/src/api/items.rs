use axum::Json;
use axum::extract::{MatchedPath, Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;

use itemstore_core::ItemEnvelope;

use super::AppState;
use super::body::ValidatedJson;
use super::owner_header;
use crate::auth::AuthContext;
use crate::error::HttpError;
use crate::item_service::PutRequest;

/// Authenticate the request, then run the orthogonal capability check
/// against the resolved access for `method`+`matched_path`.
fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    matched_path: &str,
) -> Result<AuthContext, HttpError> {
    let Some(pipeline) = &state.auth else {
        return Ok(AuthContext::anonymous());
    };
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let auth = pipeline.authenticate(header).map_err(HttpError::from)?;

    let method_and_path = format!("{method}:{matched_path}");
    pipeline
        .check_capability(&method_and_path, &auth.capabilities)
        .map_err(HttpError::from)?;

    Ok(auth)
}

/// `PUT {api_base}/store/{bucket}/{id}`.
#[utoipa::path(
    put,
    path = "/store/{bucket}/{id}",
    tag = "Store",
    params(("bucket" = String, Path), ("id" = String, Path)),
    request_body = PutItemBody,
    responses(
        (status = 201, description = "Item created", body = ItemEnvelope),
        (status = 200, description = "Item replaced", body = ItemEnvelope),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Owner mismatch"),
    )
)]
pub async fn put_item(
    State(state): State<AppState>,
    method: Method,
    matched_path: MatchedPath,
    Path((bucket, id)): Path<(String, String)>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<PutRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let auth = authenticate(&state, &headers, &method, matched_path.as_str())?;
    let owner = owner_header(&headers);

    let outcome = state
        .item_service
        .put(&bucket, &id, body, &owner, auth.is_super_user())
        .await
        .map_err(HttpError::from)?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.envelope)))
}

/// `GET {api_base}/store/{bucket}/{id}`.
#[utoipa::path(
    get,
    path = "/store/{bucket}/{id}",
    tag = "Store",
    params(("bucket" = String, Path), ("id" = String, Path)),
    responses(
        (status = 200, description = "Item found", body = ItemEnvelope),
        (status = 404, description = "Not found"),
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    method: Method,
    matched_path: MatchedPath,
    Path((bucket, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let auth = authenticate(&state, &headers, &method, matched_path.as_str())?;
    let owner = owner_header(&headers);

    let envelope = state
        .item_service
        .get(&bucket, &id, &owner, auth.is_super_user())
        .await
        .map_err(HttpError::from)?;
    Ok((StatusCode::OK, Json(envelope)))
}

/// `DELETE {api_base}/store/{bucket}/{id}`.
#[utoipa::path(
    delete,
    path = "/store/{bucket}/{id}",
    tag = "Store",
    params(("bucket" = String, Path), ("id" = String, Path)),
    responses(
        (status = 200, description = "Deleted item", body = ItemEnvelope),
        (status = 404, description = "Not found"),
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    method: Method,
    matched_path: MatchedPath,
    Path((bucket, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let auth = authenticate(&state, &headers, &method, matched_path.as_str())?;
    let owner = owner_header(&headers);

    let envelope = state
        .item_service
        .delete(&bucket, &id, &owner, auth.is_super_user())
        .await
        .map_err(HttpError::from)?;
    Ok((StatusCode::OK, Json(envelope)))
}

/// `GET {api_base}/store/{bucket}`.
#[utoipa::path(
    get,
    path = "/store/{bucket}",
    tag = "Store",
    params(("bucket" = String, Path)),
    responses(
        (status = 200, description = "Items visible to the caller", body = [ItemEnvelope]),
    )
)]
pub async fn get_all_items(
    State(state): State<AppState>,
    method: Method,
    matched_path: MatchedPath,
    Path(bucket): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let auth = authenticate(&state, &headers, &method, matched_path.as_str())?;
    let owner = owner_header(&headers);

    let envelopes = state
        .item_service
        .get_all(&bucket, &owner, auth.is_super_user())
        .await
        .map_err(HttpError::from)?;
    Ok((StatusCode::OK, Json(envelopes)))
}

/// Request body schema, duplicated from [`PutRequest`] purely for OpenAPI
/// documentation (the handler deserializes the real type directly).
#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct PutItemBody {
    pub id: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub ttl: Option<u64>,
}
