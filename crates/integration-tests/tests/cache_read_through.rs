//! Read-through cache contract, observed through the HTTP API with
//! call-counted in-memory repositories.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

use samovar_integration_tests::{TestApp, product};
use samovar_server::cache::{CacheBackend, CacheError, QueryCache};

#[tokio::test]
async fn second_identical_list_is_served_from_cache() {
    let app = TestApp::new();
    app.products.seed(product(1, "Tea", 10)).await;

    let (status, first) = app.get("/api/product?page=1&limit=8").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.products.list_calls(), 1);

    let (status, second) = app.get("/api/product?page=1&limit=8").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.products.list_calls(), 1, "second read must not hit the repo");
    assert_eq!(first, second);
}

#[tokio::test]
async fn different_filters_are_different_cache_entries() {
    let app = TestApp::new();
    app.products.seed(product(1, "Tea", 10)).await;

    app.get("/api/product?page=1").await;
    app.get("/api/product?page=2").await;
    assert_eq!(app.products.list_calls(), 2);

    // Absent filter and explicit empty search are distinct requests.
    app.get("/api/product?page=1&search=").await;
    assert_eq!(app.products.list_calls(), 3);
}

#[tokio::test]
async fn product_detail_is_cached() {
    let app = TestApp::new();
    app.products.seed(product(5, "Tea", 10)).await;

    let (status, _) = app.get("/api/product/5").await;
    assert_eq!(status, StatusCode::OK);
    app.get("/api/product/5").await;
    assert_eq!(app.products.get_calls(), 1);
}

#[tokio::test]
async fn writes_invalidate_the_resource_prefix() {
    let app = TestApp::new();
    app.products.seed(product(1, "Tea", 10)).await;

    app.get("/api/product").await;
    assert_eq!(app.products.list_calls(), 1);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/product",
            &json!({ "name": "Oolong", "description": "a tea", "price": 12 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/product").await;
    assert_eq!(app.products.list_calls(), 2, "create must invalidate the list");
    assert_eq!(body["count"], json!(2));
}

#[tokio::test]
async fn invalidation_is_scoped_to_one_resource() {
    let app = TestApp::new();
    app.products.seed(product(1, "Tea", 10)).await;
    app.product_types.seed("teas").await;

    app.get("/api/product/type").await;
    assert_eq!(app.product_types.list_calls(), 1);

    // A product write must not evict the cached type listing.
    app.send_json(
        "POST",
        "/api/product",
        &json!({ "name": "Oolong", "description": "a tea", "price": 12 }),
    )
    .await;

    app.get("/api/product/type").await;
    assert_eq!(app.product_types.list_calls(), 1);
}

#[tokio::test]
async fn order_status_update_invalidates_order_listings() {
    let app = TestApp::new();
    let (status, created) = app
        .send_json(
            "POST",
            "/api/order",
            &json!({
                "items": [{ "productId": 5, "quantity": 1, "price": 10 }],
                "totalAmount": 10,
                "shippingAddress": "Street 1"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().expect("order id");

    app.get("/api/order").await;
    app.get("/api/order").await;
    assert_eq!(app.orders.list_calls(), 1);

    let (status, _) = app
        .send_json(
            "PUT",
            &format!("/api/order/{id}/status"),
            &json!({ "status": "processing" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/order").await;
    assert_eq!(app.orders.list_calls(), 2);
    assert_eq!(body["orders"][0]["status"], json!("processing"));
}

struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn fetch(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend("connection refused".to_owned()))
    }

    async fn store(&self, _key: &str, _ttl: Duration, _payload: String) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_owned()))
    }

    async fn remove_prefix(&self, _prefix: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".to_owned()))
    }
}

#[tokio::test]
async fn cache_store_failures_never_fail_requests() {
    let app = TestApp::with_cache(QueryCache::new(Arc::new(FailingBackend)));
    app.products.seed(product(1, "Tea", 10)).await;

    let (status, body) = app.get("/api/product").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));

    let (status, _) = app.get("/api/product").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.products.list_calls(),
        2,
        "every read falls through to the source of truth"
    );
}
