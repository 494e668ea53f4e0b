//! The order-confirmation handshake: web app → `/web-data` → pending
//! order → inline keyboard prompt, plus the administrative status API.

use axum::http::StatusCode;
use serde_json::json;

use samovar_core::OrderStatus;
use samovar_integration_tests::TestApp;

fn tea_cart() -> serde_json::Value {
    json!({
        "queryId": "q1",
        "chatId": 1,
        "products": [{ "id": 5, "name": "Tea", "price": 10, "quantity": 2 }],
        "totalPrice": 20
    })
}

#[tokio::test]
async fn cart_submission_persists_order_and_sends_prompt() {
    let app = TestApp::new();
    app.authenticate(1, 42, "Street 1").await;

    let (status, body) = app.send_json("POST", "/web-data", &tea_cart()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("confirmation_sent"));
    assert_eq!(body["orderId"], json!(1));

    let orders = app.orders.all().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.status, OrderStatus::Pending);
    assert_eq!(orders[0].order.total_amount.to_string(), "20");
    assert_eq!(orders[0].order.shipping_address, "Street 1");
    assert_eq!(orders[0].items.len(), 1);

    let sent = app.outbound.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat.0, 1);
    assert!(sent[0].text.contains("2 × Tea — 20"));
    assert!(sent[0].text.contains("Total: 20"));
    assert!(sent[0].text.contains("Street 1"));
    let callbacks = sent[0].callback_data();
    assert!(callbacks.contains(&"confirm_order_q1_1".to_owned()));
    assert!(callbacks.contains(&"change_address_1".to_owned()));
}

#[tokio::test]
async fn unauthenticated_cart_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.send_json("POST", "/web-data", &tea_cart()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("not_authenticated"));
    assert!(body["message"].is_string());
    assert!(app.orders.all().await.is_empty(), "no pending order created");
    assert!(app.outbound.sent().await.is_empty());
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new();
    app.authenticate(1, 42, "Street 1").await;

    let (status, _) = app
        .send_json(
            "POST",
            "/web-data",
            &json!({ "queryId": "q1", "chatId": 1, "products": [], "totalPrice": 0 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.orders.all().await.is_empty());
}

#[tokio::test]
async fn dead_order_store_degrades_but_still_prompts() {
    let app = TestApp::new();
    app.authenticate(1, 42, "Street 1").await;
    app.orders.go_offline().await;

    let (status, body) = app.send_json("POST", "/web-data", &tea_cart()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("confirmation_sent"));
    assert_eq!(body["orderId"], json!(null));

    let sent = app.outbound.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("could not be recorded"));
    assert!(
        sent[0]
            .callback_data()
            .contains(&"confirm_order_q1_nodb".to_owned())
    );
}

#[tokio::test]
async fn status_update_is_idempotent() {
    let app = TestApp::new();
    let (_, created) = app
        .send_json(
            "POST",
            "/api/order",
            &json!({
                "items": [{ "productId": 5, "quantity": 2, "price": 10 }],
                "totalAmount": 20,
                "shippingAddress": "Street 1"
            }),
        )
        .await;
    let id = created["id"].as_i64().expect("order id");

    let (status, first) = app
        .send_json(
            "PUT",
            &format!("/api/order/{id}/status"),
            &json!({ "status": "processing" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], json!("processing"));

    let (status, second) = app
        .send_json(
            "PUT",
            &format!("/api/order/{id}/status"),
            &json!({ "status": "processing" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "re-confirming must not error");
    assert_eq!(second["status"], json!("processing"));
}

#[tokio::test]
async fn invalid_status_value_is_a_bad_request() {
    let app = TestApp::new();
    let (status, _) = app
        .send_json(
            "PUT",
            "/api/order/1/status",
            &json!({ "status": "shipped" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/order/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/order/999/status",
            &json!({ "status": "processing" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_listing_matches_the_admin_shape() {
    let app = TestApp::new();
    app.authenticate(1, 42, "Street 1").await;
    app.send_json("POST", "/web-data", &tea_cart()).await;

    let (status, body) = app.get("/api/order?status=all&page=1&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], json!(1));
    assert_eq!(body["totalPages"], json!(1));
    assert_eq!(body["currentPage"], json!(1));
    assert_eq!(body["orders"][0]["status"], json!("pending"));
    assert_eq!(body["orders"][0]["items"][0]["quantity"], json!(2));
}
