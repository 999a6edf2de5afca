use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use itemstore_server::api::{self, AppState};
use itemstore_server::item_service::ItemService;
use itemstore_store::StoreFacade;
use itemstore_store_memory::MemoryStore;

const API_BASE: &str = "/api/v1";

fn hex_id(fill: char) -> String {
    std::iter::repeat_n(fill, 64).collect()
}

fn build_server() -> TestServer {
    let store = Arc::new(StoreFacade::new(Arc::new(MemoryStore::default())));
    let item_service = Arc::new(ItemService::new(
        Arc::clone(&store),
        itemstore_core::InputValidation::default(),
        86400,
    ));
    let state = AppState {
        item_service,
        store,
        auth: None,
    };
    let app = api::router(state, API_BASE, 1024 * 1024);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn oversize_body_is_rejected_with_413() {
    let store = Arc::new(StoreFacade::new(Arc::new(MemoryStore::default())));
    let item_service = Arc::new(ItemService::new(
        Arc::clone(&store),
        itemstore_core::InputValidation::default(),
        86400,
    ));
    let state = AppState {
        item_service,
        store,
        auth: None,
    };
    let app = api::router(state, API_BASE, 16);
    let server = TestServer::new(app).unwrap();

    let id = hex_id('9');
    let response = server
        .put(&format!("{API_BASE}/store/planets/{id}"))
        .json(&json!({"id": id, "data": {"much longer than sixteen bytes": true}, "ttl": 300}))
        .await;
    response.assert_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_returns_200() {
    let server = build_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn metrics_returns_counters() {
    let server = build_server();
    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["pushes"], 0);
}

#[tokio::test]
async fn put_creates_then_get_reads_it_back() {
    let server = build_server();
    let id = hex_id('a');
    let path = format!("{API_BASE}/store/planets/{id}");

    let create = server
        .put(&path)
        .add_header("X-Midt-Owner", "louis-armstrong")
        .json(&json!({"id": id, "data": {"year": 1967}, "ttl": 300}))
        .await;
    create.assert_status(axum::http::StatusCode::CREATED);

    let get = server
        .get(&path)
        .add_header("X-Midt-Owner", "louis-armstrong")
        .await;
    get.assert_status_ok();
    let body = get.json::<serde_json::Value>();
    assert_eq!(body["data"]["year"], 1967);
    assert!(body.get("owner").is_none());
}

#[tokio::test]
async fn put_on_existing_item_returns_200() {
    let server = build_server();
    let id = hex_id('b');
    let path = format!("{API_BASE}/store/planets/{id}");

    server
        .put(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .json(&json!({"id": id, "data": 1, "ttl": 300}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let replace = server
        .put(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .json(&json!({"id": id, "data": 2, "ttl": 300}))
        .await;
    replace.assert_status_ok();
}

#[tokio::test]
async fn owner_mismatch_on_get_is_not_found() {
    let server = build_server();
    let id = hex_id('c');
    let path = format!("{API_BASE}/store/planets/{id}");

    server
        .put(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .json(&json!({"id": id, "data": 1, "ttl": 300}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let get = server
        .get(&path)
        .add_header("X-Midt-Owner", "owner-b")
        .await;
    get.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_mismatch_on_put_is_forbidden() {
    let server = build_server();
    let id = hex_id('d');
    let path = format!("{API_BASE}/store/planets/{id}");

    server
        .put(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .json(&json!({"id": id, "data": 1, "ttl": 300}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let replace = server
        .put(&path)
        .add_header("X-Midt-Owner", "owner-b")
        .json(&json!({"id": id, "data": 2, "ttl": 300}))
        .await;
    replace.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_removes_item_and_returns_its_last_value() {
    let server = build_server();
    let id = hex_id('e');
    let path = format!("{API_BASE}/store/planets/{id}");

    server
        .put(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .json(&json!({"id": id, "data": {"x": 1}, "ttl": 300}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let delete = server
        .delete(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .await;
    delete.assert_status_ok();
    assert_eq!(delete.json::<serde_json::Value>()["data"]["x"], 1);

    let get_after = server
        .get(&path)
        .add_header("X-Midt-Owner", "owner-a")
        .await;
    get_after.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_all_scopes_by_owner_and_missing_header_is_empty_owner() {
    let server = build_server();
    let id_a = hex_id('f');
    let id_b = hex_id('1');

    server
        .put(&format!("{API_BASE}/store/planets/{id_a}"))
        .add_header("X-Midt-Owner", "owner-a")
        .json(&json!({"id": id_a, "data": 1, "ttl": 300}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    server
        .put(&format!("{API_BASE}/store/planets/{id_b}"))
        .json(&json!({"id": id_b, "data": 2, "ttl": 300}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let owned = server
        .get(&format!("{API_BASE}/store/planets"))
        .await;
    owned.assert_status_ok();
    let list = owned.json::<Vec<serde_json::Value>>();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn invalid_bucket_name_is_bad_request() {
    let server = build_server();
    let id = hex_id('2');
    let response = server
        .put(&format!("{API_BASE}/store/AB/{id}"))
        .json(&json!({"id": id, "data": 1, "ttl": 300}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let server = build_server();
    let id = hex_id('3');
    let response = server.get(&format!("{API_BASE}/store/planets/{id}")).await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_json_is_served() {
    let server = build_server();
    let response = server.get("/api-doc/openapi.json").await;
    response.assert_status_ok();
    let spec = response.json::<serde_json::Value>();
    let paths = spec["paths"].as_object().unwrap();
    assert!(paths.contains_key("/store/{bucket}/{id}"));
    assert!(paths.contains_key("/store/{bucket}"));
}
