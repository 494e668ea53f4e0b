//! User route handlers: registration, login, listing, role management.
//!
//! Passwords are hashed with argon2. No token issuance here; the Mini App
//! authenticates chats through the Telegram web-app handoff instead.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use samovar_core::{UserId, UserRole};

use crate::cache::{TTL_LIST, USERS_PREFIX, cache_key};
use crate::db::{NewUser, UserQuery};
use crate::error::{AppError, Result};
use crate::models::{PublicUser, UserPage};
use crate::state::AppState;

/// User listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub search: Option<String>,
}

/// Registration body.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(alias = "adress")]
    pub address: Option<String>,
    pub role: Option<String>,
}

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// Role-update body.
#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: String,
}

/// Register an account.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Value>)> {
    if body.username.is_empty() || body.password.is_empty() || body.email.is_empty() {
        return Err(AppError::BadRequest(
            "username, password and email are required".to_owned(),
        ));
    }
    let role = match body.role.as_deref() {
        None => UserRole::User,
        Some(raw) => raw
            .parse::<UserRole>()
            .map_err(|_| AppError::BadRequest(format!("invalid role: {raw}")))?,
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(body.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?
        .to_string();

    let user = state
        .users()
        .create(NewUser {
            username: body.username,
            password_hash,
            email: body.email,
            address: body.address,
            role,
        })
        .await?;
    state.cache().invalidate(USERS_PREFIX).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": PublicUser::from(user) })),
    ))
}

/// Verify credentials and return the account.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>> {
    let user = state
        .users()
        .find_by_username(&body.username)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_owned()))?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("stored hash is invalid: {e}")))?;
    Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized("invalid password".to_owned()))?;

    Ok(Json(json!({ "user": PublicUser::from(user) })))
}

/// List accounts, read-through cached under `users:getAll:*`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserPage>> {
    let key = cache_key(
        USERS_PREFIX,
        "getAll",
        &[
            ("limit", query.limit.map(|v| v.to_string())),
            ("page", query.page.map(|v| v.to_string())),
            ("search", query.search.clone()),
        ],
    );
    if let Some(page) = state.cache().get::<UserPage>(&key).await {
        return Ok(Json(page));
    }

    let page = state
        .users()
        .list(&UserQuery {
            limit: query.limit,
            page: query.page,
            search: query.search,
        })
        .await?;
    state.cache().set(&key, TTL_LIST, &page).await;
    Ok(Json(page))
}

/// Change an account's role and invalidate the user cache.
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<RoleBody>,
) -> Result<Json<PublicUser>> {
    let role = body
        .role
        .parse::<UserRole>()
        .map_err(|_| AppError::BadRequest(format!("invalid role: {}", body.role)))?;

    let user = state.users().update_role(id, role).await?;
    state.cache().invalidate(USERS_PREFIX).await;
    Ok(Json(user))
}
