//! Order repository.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use samovar_core::{NewOrder, OrderId, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderPage, OrderWithItems};

/// Filters for an order listing, defaults already applied.
#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// A numeric search term filters by order id; anything else is ignored.
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            page: 1,
            limit: 10,
            user_id: None,
        }
    }
}

/// Order persistence operations.
///
/// `update_status` is idempotent: setting the status an order already has
/// succeeds without changing anything.
#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn list(&self, query: &OrderQuery) -> Result<OrderPage, RepositoryError>;
    async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError>;
    async fn create(&self, order: NewOrder) -> Result<OrderWithItems, RepositoryError>;
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError>;
    async fn update_shipping_address(
        &self,
        id: OrderId,
        address: &str,
    ) -> Result<(), RepositoryError>;
}

/// Production [`OrderRepo`] over `PostgreSQL`.
pub struct PgOrderRepo {
    pool: PgPool,
}

impl PgOrderRepo {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price, \
                    p.name AS product_name \
             FROM order_items oi \
             JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = ANY($1) \
             ORDER BY oi.id",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }
}

const ORDER_COLUMNS: &str =
    "id, date, status, total_amount, shipping_address, user_id, qr_code_file_name";

#[async_trait]
impl OrderRepo for PgOrderRepo {
    async fn list(&self, query: &OrderQuery) -> Result<OrderPage, RepositoryError> {
        let id_filter: Option<i32> = query.search.as_ref().and_then(|s| s.parse().ok());
        let offset = (query.page - 1) * query.limit;
        let filter = "($1::order_status IS NULL OR status = $1) \
             AND ($2::int IS NULL OR user_id = $2) \
             AND ($3::int IS NULL OR id = $3)";

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} \
             ORDER BY date DESC LIMIT $4 OFFSET $5"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(query.status)
            .bind(query.user_id)
            .bind(id_filter)
            .bind(query.limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM orders WHERE {filter}");
        let total_count: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.status)
            .bind(query.user_id)
            .bind(id_filter)
            .fetch_one(&self.pool)
            .await?;

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let mut items = self.load_items(&ids).await?;

        let orders = orders
            .into_iter()
            .map(|order| {
                let items = items.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect();

        Ok(OrderPage {
            orders,
            total_pages: (total_count as u64).div_ceil(query.limit.max(1) as u64) as i64,
            current_page: query.page,
            total_count,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let Some(order) = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut items = self.load_items(&[order.id.as_i32()]).await?;
        let items = items.remove(&order.id).unwrap_or_default();
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn create(&self, order: NewOrder) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO orders (user_id, total_amount, shipping_address, status) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.user_id)
            .bind(order.total_amount)
            .bind(&order.shipping_address)
            .bind(OrderStatus::Pending)
            .fetch_one(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(created.id)
            .bind(item.product_id)
            .bind(i64::from(item.quantity))
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(created.id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_shipping_address(
        &self,
        id: OrderId,
        address: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET shipping_address = $2 WHERE id = $1")
            .bind(id)
            .bind(address)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
