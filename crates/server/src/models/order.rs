//! Order models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use samovar_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// An order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: String,
    pub user_id: Option<UserId>,
    /// Reference to a generated QR code file, when one exists.
    pub qr_code_file_name: Option<String>,
}

/// An order line with the joined product name for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Price,
    pub product_name: String,
}

/// An order with its line items, as returned by detail and create calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One page of orders in the shape the admin frontend consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_count: i64,
}
