//! Order contract types shared between the API and the bot.

use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, ProductId, UserId};
use crate::types::price::Price;
use crate::types::status::OrderStatus;

/// A line item for an order about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// An order about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub items: Vec<NewOrderItem>,
    pub total_amount: Price,
    pub shipping_address: String,
}

/// The persisted view of an order the bot needs for the confirmation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: String,
}
