//! Order gateway backing the bot's confirmation flow.
//!
//! Wraps the order repository and ties every successful mutation to an
//! `orders` cache invalidation, sequenced before the result is returned,
//! so the flow's caller never races a stale read.

use std::sync::Arc;

use async_trait::async_trait;

use samovar_bot::gateway::{GatewayError, OrderGateway};
use samovar_core::{NewOrder, OrderId, OrderStatus, PlacedOrder};

use crate::cache::{ORDERS_PREFIX, QueryCache};
use crate::db::{OrderRepo, RepositoryError};

/// [`OrderGateway`] over the order repository and the query cache.
pub struct RepoOrderGateway {
    orders: Arc<dyn OrderRepo>,
    cache: QueryCache,
}

impl RepoOrderGateway {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepo>, cache: QueryCache) -> Self {
        Self { orders, cache }
    }
}

fn map_error(id: Option<OrderId>, e: RepositoryError) -> GatewayError {
    match (id, e) {
        (Some(id), RepositoryError::NotFound) => GatewayError::NotFound(id),
        (_, e) => GatewayError::Unavailable(e.to_string()),
    }
}

#[async_trait]
impl OrderGateway for RepoOrderGateway {
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, GatewayError> {
        let created = self
            .orders
            .create(order)
            .await
            .map_err(|e| map_error(None, e))?;
        self.cache.invalidate(ORDERS_PREFIX).await;
        Ok(PlacedOrder {
            id: created.order.id,
            status: created.order.status,
            total_amount: created.order.total_amount,
            shipping_address: created.order.shipping_address,
        })
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<PlacedOrder, GatewayError> {
        let updated = self
            .orders
            .update_status(id, status)
            .await
            .map_err(|e| map_error(Some(id), e))?;
        self.cache.invalidate(ORDERS_PREFIX).await;
        Ok(PlacedOrder {
            id: updated.id,
            status: updated.status,
            total_amount: updated.total_amount,
            shipping_address: updated.shipping_address,
        })
    }

    async fn update_shipping_address(
        &self,
        id: OrderId,
        address: &str,
    ) -> Result<(), GatewayError> {
        self.orders
            .update_shipping_address(id, address)
            .await
            .map_err(|e| map_error(Some(id), e))?;
        self.cache.invalidate(ORDERS_PREFIX).await;
        Ok(())
    }
}
