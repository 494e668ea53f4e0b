//! Product and product-type models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use samovar_core::{Price, ProductId, ProductTypeId};

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub rating: f64,
    pub price: Price,
    pub in_stock: bool,
    /// Image file name served by the static file host.
    pub img: String,
    pub product_type_id: Option<ProductTypeId>,
    pub created_at: DateTime<Utc>,
}

/// One page of products with the total row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub count: i64,
    pub rows: Vec<Product>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub id: ProductTypeId,
    pub name: String,
}

/// One page of product types with the total row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTypePage {
    pub count: i64,
    pub rows: Vec<ProductType>,
}
