//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Health check
//! POST /web-data                   - Cart submission from the Mini App
//!
//! # Products
//! GET  /api/product                - Product listing (cached)
//! POST /api/product                - Create product
//! GET  /api/product/{id}           - Product detail (cached)
//! PUT  /api/product/{id}           - Update product
//! DELETE /api/product/{id}         - Delete product
//!
//! # Product types
//! GET  /api/product/type           - Type listing (cached)
//! POST /api/product/type           - Create type
//! PUT  /api/product/type/{id}      - Rename type
//! DELETE /api/product/type/{id}    - Delete type
//!
//! # Orders
//! GET  /api/order                  - Order listing (cached)
//! GET  /api/order/{id}             - Order detail (cached)
//! POST /api/order                  - Create order
//! PUT  /api/order/{id}/status      - Update order status
//!
//! # Users
//! POST /api/user/register          - Register account
//! POST /api/user/login             - Verify credentials
//! GET  /api/user                   - User listing (cached)
//! PUT  /api/user/{id}              - Update account role
//! ```
//!
//! Every list/detail read goes through the read-through cache; every
//! write invalidates its resource prefix before responding.

pub mod orders;
pub mod product_types;
pub mod products;
pub mod users;
pub mod web_data;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/web-data", post(web_data::submit))
        .route("/api/product", get(products::list).post(products::create))
        .route(
            "/api/product/type",
            get(product_types::list).post(product_types::create),
        )
        .route(
            "/api/product/type/{id}",
            put(product_types::update).delete(product_types::remove),
        )
        .route(
            "/api/product/{id}",
            get(products::get_one)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/api/order", get(orders::list).post(orders::create))
        .route("/api/order/{id}", get(orders::get_one))
        .route("/api/order/{id}/status", put(orders::update_status))
        .route("/api/user/register", post(users::register))
        .route("/api/user/login", post(users::login))
        .route("/api/user", get(users::list))
        .route("/api/user/{id}", put(users::update_role))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}
