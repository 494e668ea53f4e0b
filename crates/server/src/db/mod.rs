//! Database access for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - storefront accounts (argon2 password hashes)
//! - `product_types` - product categories
//! - `products` - the catalogue
//! - `orders` / `order_items` - checkout results
//!
//! Repositories are traits so route handlers and the confirmation flow can
//! be exercised against in-memory implementations; the `Pg*` types are the
//! production implementations. Queries use the runtime `query_as` API with
//! `FromRow` models, so the workspace builds without a live database.
//!
//! # Migrations
//!
//! Embedded from `crates/server/migrations/` and run on startup, matching
//! the original deployment's schema auto-sync.

mod orders;
mod product_types;
mod products;
mod users;

pub use orders::{OrderQuery, OrderRepo, PgOrderRepo};
pub use product_types::{PgProductTypeRepo, ProductTypeQuery, ProductTypeRepo};
pub use products::{NewProduct, PgProductRepo, ProductQuery, ProductRepo, SortOrder, UpdateProduct};
pub use users::{NewUser, PgUserRepo, UserQuery, UserRepo};

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a unique violation.
pub(crate) fn map_insert_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_owned())
        }
        _ => RepositoryError::Database(e),
    }
}
