//! Order route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use samovar_core::{NewOrder, NewOrderItem, OrderId, OrderStatus, Price, UserId};

use crate::cache::{ORDERS_PREFIX, TTL_LIST, cache_key};
use crate::db::OrderQuery;
use crate::error::{AppError, Result};
use crate::models::{Order, OrderPage, OrderWithItems};
use crate::state::AppState;

/// Order listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub user_id: Option<UserId>,
}

/// Body for order creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub items: Vec<NewOrderItem>,
    pub total_amount: Price,
    pub shipping_address: String,
    pub user_id: Option<UserId>,
}

/// Body for a status update.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>> {
    match raw {
        None | Some("all") => Ok(None),
        Some(value) => value
            .parse::<OrderStatus>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid order status: {value}"))),
    }
}

/// List orders, read-through cached under `orders:getAll:*`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderPage>> {
    let status = parse_status_filter(query.status.as_deref())?;

    let key = cache_key(
        ORDERS_PREFIX,
        "getAll",
        &[
            ("status", query.status.clone()),
            ("search", query.search.clone()),
            ("page", query.page.map(|v| v.to_string())),
            ("limit", query.limit.map(|v| v.to_string())),
            ("userId", query.user_id.map(|v| v.to_string())),
        ],
    );
    if let Some(page) = state.cache().get::<OrderPage>(&key).await {
        return Ok(Json(page));
    }

    let defaults = OrderQuery::default();
    let page = state
        .orders()
        .list(&OrderQuery {
            status,
            search: query.search,
            page: query.page.unwrap_or(defaults.page),
            limit: query.limit.unwrap_or(defaults.limit),
            user_id: query.user_id,
        })
        .await?;
    state.cache().set(&key, TTL_LIST, &page).await;
    Ok(Json(page))
}

/// Order detail, read-through cached under `orders:getOne:*`.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithItems>> {
    let key = cache_key(ORDERS_PREFIX, "getOne", &[("id", Some(id.to_string()))]);
    if let Some(order) = state.cache().get::<OrderWithItems>(&key).await {
        return Ok(Json(order));
    }

    let order = state
        .orders()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    state.cache().set(&key, TTL_LIST, &order).await;
    Ok(Json(order))
}

/// Create an order administratively and invalidate the order cache.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest("no items in the order".to_owned()));
    }

    let order = state
        .orders()
        .create(NewOrder {
            user_id: body.user_id,
            items: body.items,
            total_amount: body.total_amount,
            shipping_address: body.shipping_address,
        })
        .await?;
    state.cache().invalidate(ORDERS_PREFIX).await;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Update an order's status and invalidate the order cache.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Order>> {
    let status = body
        .status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::BadRequest(format!("invalid order status: {}", body.status)))?;

    let order = state.orders().update_status(id, status).await?;
    state.cache().invalidate(ORDERS_PREFIX).await;
    Ok(Json(order))
}
