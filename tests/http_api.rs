//! HTTP Surface Tests
//!
//! Drives the axum router in-process with `oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pageforge::data::GenericDataService;
use pageforge::http_server::{build_router, AppState, HttpServerConfig};
use pageforge::schema::SchemaRegistry;
use pageforge::storage::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Test Utilities
// =============================================================================

fn app() -> Router {
    let service = GenericDataService::new(SchemaRegistry::new(Arc::new(MemoryStore::new())));
    build_router(&HttpServerConfig::default(), Arc::new(AppState::new(service)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => request
            .header("content-type", "application/json")
            .body(Body::from(b.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn products() -> Value {
    json!({
        "page_name": "Products",
        "page_description": "Everything we sell",
        "route": "/products",
        "table_name": "table_products",
        "fields": [
            {"field_name": "title", "field_type": "text", "is_required": true, "is_used_for_search": true},
            {"field_name": "price", "field_type": "number", "is_used_for_stats": true}
        ]
    })
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_page_crud() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/api/pages", Some(products())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/pages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/pages/{}", id),
        Some(json!({"page_description": "Catalog"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page_description"], "Catalog");
    assert_eq!(body["data"]["version"], 2);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/pages/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {}}));

    let (status, body) = send(&app, Method::GET, &format!("/api/pages/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Page not found");
}

#[tokio::test]
async fn test_duplicate_page_is_bad_request() {
    let app = app();
    send(&app, Method::POST, "/api/pages", Some(products())).await;
    let (status, body) = send(&app, Method::POST, "/api/pages", Some(products())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/pages")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_conflict_with_orphan_table_is_500() {
    let store = Arc::new(MemoryStore::new());
    let registry = SchemaRegistry::new(store.clone());
    let app = build_router(
        &HttpServerConfig::default(),
        Arc::new(AppState::new(GenericDataService::new(registry))),
    );

    let (_, body) = send(&app, Method::POST, "/api/pages", Some(products())).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    use pageforge::storage::CollectionStore;
    store.ensure_collection("table_orphan").unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/pages/{}", id),
        Some(json!({"table_name": "table_orphan"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to rename database table.");
}

// =============================================================================
// Data
// =============================================================================

#[tokio::test]
async fn test_record_crud() {
    let app = app();
    send(&app, Method::POST, "/api/pages", Some(products())).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/data/table_products",
        Some(json!({"title": "Widget", "price": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], "Widget");
    assert_eq!(body["data"]["price"], 10);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"]["createdAt"].is_string());

    let uri = format!("/api/data/table_products/{}", id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"title": "Gadget"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Gadget");
    assert_eq!(body["data"]["price"], 10);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item not found");
}

#[tokio::test]
async fn test_missing_required_field_is_400() {
    let app = app();
    send(&app, Method::POST, "/api/pages", Some(products())).await;

    let (status, body) = send(&app, Method::POST, "/api/data/table_products", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "title is required"}));

    let (_, listing) = send(&app, Method::GET, "/api/data/table_products", None).await;
    assert_eq!(listing["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_unknown_table_is_404() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/data/table_ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/data/table_ghost",
        Some(json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_shape_and_search() {
    let app = app();
    send(&app, Method::POST, "/api/pages", Some(products())).await;
    for (title, price) in [("Widget", 10), ("Gadget", 20), ("Wingnut", 30)] {
        send(
            &app,
            Method::POST,
            "/api/data/table_products",
            Some(json!({"title": title, "price": price})),
        )
        .await;
    }

    let (status, body) = send(&app, Method::GET, "/api/data/table_products?page=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(
        body["pagination"],
        json!({"total": 3, "page": 1, "limit": 2, "pages": 2})
    );

    let (_, body) = send(&app, Method::GET, "/api/data/table_products?search=wi", None).await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = send(&app, Method::GET, "/api/data/table_products?page=abc&limit=0", None).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = app();
    send(&app, Method::POST, "/api/pages", Some(products())).await;
    for price in [10, 20, 30] {
        send(
            &app,
            Method::POST,
            "/api/data/table_products",
            Some(json!({"title": "x", "price": price})),
        )
        .await;
    }

    let (status, body) = send(&app, Method::GET, "/api/stats/table_products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_records"], 3);
    let price = &body["data"]["fields"][0];
    assert_eq!(price["field_name"], "price");
    assert_eq!(price["sum"].as_f64(), Some(60.0));
    assert_eq!(price["avg"].as_f64(), Some(20.0));
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
