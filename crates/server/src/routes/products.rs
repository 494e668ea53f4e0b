//! Product route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use samovar_core::{Price, ProductId, ProductTypeId};

use crate::cache::{PRODUCTS_PREFIX, TTL_LIST, TTL_PRODUCT_DETAIL, cache_key};
use crate::db::{NewProduct, ProductQuery, SortOrder, UpdateProduct};
use crate::error::{AppError, Result};
use crate::models::{Product, ProductPage};
use crate::state::AppState;

/// Catalogue listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub product_type_id: Option<ProductTypeId>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub search: Option<String>,
    pub sort_order: Option<String>,
}

/// Body for product create/update. Image upload lives with the static
/// file host; the API only records the stored file name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    pub img: Option<String>,
    pub product_type_id: Option<ProductTypeId>,
}

const fn default_in_stock() -> bool {
    true
}

/// List products, read-through cached under `products:getAll:*`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductPage>> {
    let key = cache_key(
        PRODUCTS_PREFIX,
        "getAll",
        &[
            ("productTypeId", query.product_type_id.map(|v| v.to_string())),
            ("limit", query.limit.map(|v| v.to_string())),
            ("page", query.page.map(|v| v.to_string())),
            ("search", query.search.clone()),
            ("sortOrder", query.sort_order.clone()),
        ],
    );
    if let Some(page) = state.cache().get::<ProductPage>(&key).await {
        return Ok(Json(page));
    }

    let defaults = ProductQuery::default();
    let repo_query = ProductQuery {
        product_type_id: query.product_type_id,
        limit: query.limit.unwrap_or(defaults.limit),
        page: query.page.unwrap_or(defaults.page),
        search: query.search,
        sort_order: query.sort_order.as_deref().and_then(SortOrder::parse),
    };
    let page = state.products().list(&repo_query).await?;
    state.cache().set(&key, TTL_LIST, &page).await;
    Ok(Json(page))
}

/// Product detail, cached for two hours.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let key = cache_key(PRODUCTS_PREFIX, "getById", &[("id", Some(id.to_string()))]);
    if let Some(product) = state.cache().get::<Product>(&key).await {
        return Ok(Json(product));
    }

    let product = state
        .products()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    state.cache().set(&key, TTL_PRODUCT_DETAIL, &product).await;
    Ok(Json(product))
}

/// Create a product and invalidate the catalogue cache.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Product>> {
    let product = state
        .products()
        .create(NewProduct {
            name: body.name,
            description: body.description,
            price: body.price,
            in_stock: body.in_stock,
            img: body.img.unwrap_or_default(),
            product_type_id: body.product_type_id,
        })
        .await?;
    state.cache().invalidate(PRODUCTS_PREFIX).await;
    Ok(Json(product))
}

/// Update a product and invalidate the catalogue cache.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Product>> {
    let product = state
        .products()
        .update(
            id,
            UpdateProduct {
                name: body.name,
                description: body.description,
                price: body.price,
                in_stock: body.in_stock,
                img: body.img,
                product_type_id: body.product_type_id,
            },
        )
        .await?;
    state.cache().invalidate(PRODUCTS_PREFIX).await;
    Ok(Json(product))
}

/// Delete a product and invalidate the catalogue cache.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    state.products().delete(id).await?;
    state.cache().invalidate(PRODUCTS_PREFIX).await;
    Ok(Json(json!({ "message": "Product deleted" })))
}
