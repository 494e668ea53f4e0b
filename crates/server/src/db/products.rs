//! Product repository.

use async_trait::async_trait;
use sqlx::PgPool;

use samovar_core::{Price, ProductId, ProductTypeId};

use super::RepositoryError;
use crate::models::{Product, ProductPage};

/// Price sort direction requested by the catalogue UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse the `sortOrder` query value; anything unknown means the
    /// default newest-first ordering.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    const fn order_clause(this: Option<Self>) -> &'static str {
        match this {
            Some(Self::Asc) => "price ASC",
            Some(Self::Desc) => "price DESC",
            None => "created_at DESC",
        }
    }
}

/// Filters for a catalogue listing, defaults already applied.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub product_type_id: Option<ProductTypeId>,
    pub limit: i64,
    pub page: i64,
    pub search: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            product_type_id: None,
            limit: 8,
            page: 1,
            search: None,
            sort_order: None,
        }
    }
}

/// A product to be created.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub in_stock: bool,
    pub img: String,
    pub product_type_id: Option<ProductTypeId>,
}

/// Replacement fields for a product update; `img` is only replaced when a
/// new file name is supplied.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub in_stock: bool,
    pub img: Option<String>,
    pub product_type_id: Option<ProductTypeId>,
}

/// Catalogue persistence operations.
#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn list(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError>;
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;
    async fn update(&self, id: ProductId, product: UpdateProduct)
    -> Result<Product, RepositoryError>;
    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;
}

/// Production [`ProductRepo`] over `PostgreSQL`.
pub struct PgProductRepo {
    pool: PgPool,
}

impl PgProductRepo {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, rating, price, in_stock, img, product_type_id, created_at";

#[async_trait]
impl ProductRepo for PgProductRepo {
    async fn list(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError> {
        let offset = (query.page - 1) * query.limit;
        let filter = "($1::int IS NULL OR product_type_id = $1) \
             AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' \
                  OR description ILIKE '%' || $2 || '%')";

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {filter} ORDER BY {} LIMIT $3 OFFSET $4",
            SortOrder::order_clause(query.sort_order),
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(query.product_type_id)
            .bind(query.search.as_deref())
            .bind(query.limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE {filter}");
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.product_type_id)
            .bind(query.search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(ProductPage { count, rows })
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products (name, description, price, in_stock, img, product_type_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.in_stock)
            .bind(&product.img)
            .bind(product.product_type_id)
            .fetch_one(&self.pool)
            .await
            .map_err(super::map_insert_error)
    }

    async fn update(
        &self,
        id: ProductId,
        product: UpdateProduct,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE products SET name = $2, description = $3, price = $4, in_stock = $5, \
             img = COALESCE($6, img), product_type_id = $7 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.in_stock)
            .bind(product.img.as_deref())
            .bind(product.product_type_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
