//! Product-type repository.

use async_trait::async_trait;
use sqlx::PgPool;

use samovar_core::ProductTypeId;

use super::RepositoryError;
use crate::models::{ProductType, ProductTypePage};

/// Filters for a product-type listing. The original endpoint returns the
/// whole table when no paging is requested, so `limit`/`page` stay
/// optional here.
#[derive(Debug, Clone, Default)]
pub struct ProductTypeQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub search: Option<String>,
}

/// Product-type persistence operations.
#[async_trait]
pub trait ProductTypeRepo: Send + Sync {
    async fn list(&self, query: &ProductTypeQuery) -> Result<ProductTypePage, RepositoryError>;
    async fn create(&self, name: &str) -> Result<ProductType, RepositoryError>;
    async fn rename(&self, id: ProductTypeId, name: &str) -> Result<ProductType, RepositoryError>;
    async fn delete(&self, id: ProductTypeId) -> Result<(), RepositoryError>;
}

/// Production [`ProductTypeRepo`] over `PostgreSQL`.
pub struct PgProductTypeRepo {
    pool: PgPool,
}

impl PgProductTypeRepo {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductTypeRepo for PgProductTypeRepo {
    async fn list(&self, query: &ProductTypeQuery) -> Result<ProductTypePage, RepositoryError> {
        let filter = "($1::text IS NULL OR name ILIKE '%' || $1 || '%')";

        let rows = if query.limit.is_some() || query.page.is_some() {
            let limit = query.limit.unwrap_or(10);
            let offset = (query.page.unwrap_or(1) - 1) * limit;
            let sql = format!(
                "SELECT id, name FROM product_types WHERE {filter} ORDER BY id LIMIT $2 OFFSET $3"
            );
            sqlx::query_as::<_, ProductType>(&sql)
                .bind(query.search.as_deref())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!("SELECT id, name FROM product_types WHERE {filter} ORDER BY id");
            sqlx::query_as::<_, ProductType>(&sql)
                .bind(query.search.as_deref())
                .fetch_all(&self.pool)
                .await?
        };

        let count_sql = format!("SELECT COUNT(*) FROM product_types WHERE {filter}");
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(ProductTypePage { count, rows })
    }

    async fn create(&self, name: &str) -> Result<ProductType, RepositoryError> {
        sqlx::query_as::<_, ProductType>(
            "INSERT INTO product_types (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(super::map_insert_error)
    }

    async fn rename(&self, id: ProductTypeId, name: &str) -> Result<ProductType, RepositoryError> {
        sqlx::query_as::<_, ProductType>(
            "UPDATE product_types SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ProductTypeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
