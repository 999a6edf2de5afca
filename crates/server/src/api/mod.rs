pub mod body;
pub mod health;
pub mod items;
pub mod openapi;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use itemstore_store::StoreFacade;

use crate::auth::AuthPipeline;
use crate::item_service::ItemService;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub item_service: Arc<ItemService>,
    pub store: Arc<StoreFacade>,
    /// `None` when auth is disabled: every request is treated as the
    /// anonymous, regular-access principal.
    pub auth: Option<Arc<AuthPipeline>>,
}

/// Build the Axum router: the four store routes under `api_base`, plus
/// always-public `/health` and `/metrics`.
///
/// `max_body_bytes` rejects oversize request bodies (413) before they reach
/// any handler or JSON extractor.
pub fn router(state: AppState, api_base: &str, max_body_bytes: usize) -> Router {
    let store_routes = Router::new()
        .route(
            "/store/{bucket}/{id}",
            get(items::get_item).put(items::put_item).delete(items::delete_item),
        )
        .route("/store/{bucket}", get(items::get_all_items));

    Router::new()
        .nest(api_base, store_routes)
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}

/// Recovered panics surface as a distinguished 555 so operators can alarm on
/// internal faults separately from client (4xx) and backend (5xx) errors.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let message = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic payload")
    };
    tracing::error!(panic = %message, "recovered from panic in request handler");

    let status = StatusCode::from_u16(555).expect("555 is a valid status code");
    (status, axum::Json(serde_json::json!({ "error": "internal error" }))).into_response()
}

/// Extract the `X-Midt-Owner` header, treating a missing header as the
/// empty-string owner (spec §3).
pub(crate) fn owner_header(headers: &HeaderMap) -> String {
    headers
        .get("X-Midt-Owner")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
