//! Persistence seam for the confirmation flow.
//!
//! The orchestrator never talks to the database directly; the server crate
//! implements this trait over its order repository and cache invalidation.

use async_trait::async_trait;
use thiserror::Error;

use samovar_core::{NewOrder, OrderId, OrderStatus, PlacedOrder};

/// Failure while persisting or mutating an order.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The order store could not be reached; the flow degrades and keeps
    /// the user moving.
    #[error("order service unavailable: {0}")]
    Unavailable(String),

    /// The referenced order does not exist.
    #[error("order {0} not found")]
    NotFound(OrderId),
}

/// What the checkout flow needs from order persistence.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Persist a new pending order and return its stored form.
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, GatewayError>;

    /// Move an order to `status`.
    ///
    /// Setting a status the order already has is a no-op, not an error, so
    /// double-tapping the confirm button stays harmless.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<PlacedOrder, GatewayError>;

    /// Replace the shipping address of an order awaiting confirmation.
    async fn update_shipping_address(
        &self,
        id: OrderId,
        address: &str,
    ) -> Result<(), GatewayError>;
}
