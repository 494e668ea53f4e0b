//! Cart submission endpoint for the Mini App.
//!
//! `POST /web-data` is the entry point of the order-confirmation flow:
//! the web app posts the cart, the orchestrator persists a pending order
//! and sends the inline confirmation prompt to the originating chat.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use teloxide::types::ChatId;
use tracing::error;

use samovar_bot::orchestrator::SubmitError;
use samovar_core::{CartItem, Price};

use crate::state::AppState;

/// The cart payload posted by the Mini App.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDataBody {
    pub query_id: String,
    pub chat_id: i64,
    #[serde(default)]
    pub products: Vec<CartItem>,
    pub total_price: Price,
}

/// Accept a cart submission and kick off the confirmation flow.
pub async fn submit(State(state): State<AppState>, Json(body): Json<WebDataBody>) -> Response {
    if body.products.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation",
                "message": "cart is empty"
            })),
        )
            .into_response();
    }

    let result = state
        .flow()
        .submit_cart(
            ChatId(body.chat_id),
            &body.query_id,
            &body.products,
            body.total_price,
        )
        .await;

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "status": "confirmation_sent",
                "orderId": outcome.order_id
            })),
        )
            .into_response(),
        Err(SubmitError::NotAuthenticated) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "not_authenticated",
                "message": "Log in to the bot before placing an order"
            })),
        )
            .into_response(),
        Err(SubmitError::Outbound(e)) => {
            error!(chat_id = body.chat_id, error = %e, "confirmation prompt delivery failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
