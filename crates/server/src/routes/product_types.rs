//! Product-type route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use samovar_core::ProductTypeId;

use crate::cache::{TTL_LIST, TYPES_PREFIX, cache_key};
use crate::db::ProductTypeQuery;
use crate::error::Result;
use crate::models::{ProductType, ProductTypePage};
use crate::state::AppState;

/// Type listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub search: Option<String>,
}

/// Body for type create/rename.
#[derive(Debug, Deserialize)]
pub struct TypeBody {
    pub name: String,
}

/// List product types, read-through cached under `types:getAll:*`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductTypePage>> {
    let key = cache_key(
        TYPES_PREFIX,
        "getAll",
        &[
            ("limit", query.limit.map(|v| v.to_string())),
            ("page", query.page.map(|v| v.to_string())),
            ("search", query.search.clone()),
        ],
    );
    if let Some(page) = state.cache().get::<ProductTypePage>(&key).await {
        return Ok(Json(page));
    }

    let page = state
        .product_types()
        .list(&ProductTypeQuery {
            limit: query.limit,
            page: query.page,
            search: query.search,
        })
        .await?;
    state.cache().set(&key, TTL_LIST, &page).await;
    Ok(Json(page))
}

/// Create a type and invalidate the type cache.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<TypeBody>,
) -> Result<Json<ProductType>> {
    let created = state.product_types().create(&body.name).await?;
    state.cache().invalidate(TYPES_PREFIX).await;
    Ok(Json(created))
}

/// Rename a type and invalidate the type cache.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductTypeId>,
    Json(body): Json<TypeBody>,
) -> Result<Json<Value>> {
    state.product_types().rename(id, &body.name).await?;
    state.cache().invalidate(TYPES_PREFIX).await;
    Ok(Json(json!({ "message": "Product type updated" })))
}

/// Delete a type and invalidate the type cache.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<ProductTypeId>,
) -> Result<Json<Value>> {
    state.product_types().delete(id).await?;
    state.cache().invalidate(TYPES_PREFIX).await;
    Ok(Json(json!({ "message": "Product type deleted" })))
}
