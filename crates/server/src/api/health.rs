use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;

/// `GET /health`: pings the backend and reports liveness. Always returns
/// a body; only the status code distinguishes healthy from degraded.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Backend reachable"),
        (status = 503, description = "Backend unreachable"),
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok" })),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "health check ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
        }
    }
}

/// `GET /metrics`: a JSON snapshot of operation counters, not a Prometheus
/// exposition endpoint.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses((status = 200, description = "Operation counters")),
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.metrics().snapshot())
}
