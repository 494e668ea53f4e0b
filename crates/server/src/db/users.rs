//! User repository.

use async_trait::async_trait;
use sqlx::PgPool;

use samovar_core::{UserId, UserRole};

use super::RepositoryError;
use crate::models::{PublicUser, User, UserPage};

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub search: Option<String>,
}

/// A user to be registered; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub address: Option<String>,
    pub role: UserRole,
}

/// Account persistence operations.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn list(&self, query: &UserQuery) -> Result<UserPage, RepositoryError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn update_role(&self, id: UserId, role: UserRole)
    -> Result<PublicUser, RepositoryError>;
}

/// Production [`UserRepo`] over `PostgreSQL`.
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, address, email, role";
const PUBLIC_COLUMNS: &str = "id, username, email, role, address";

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn list(&self, query: &UserQuery) -> Result<UserPage, RepositoryError> {
        let filter = "($1::text IS NULL OR username ILIKE '%' || $1 || '%' \
             OR email ILIKE '%' || $1 || '%')";
        let limit = query.limit.unwrap_or(10);
        let offset = (query.page.unwrap_or(1) - 1) * limit;

        let sql = format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE {filter} ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PublicUser>(&sql)
            .bind(query.search.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM users WHERE {filter}");
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(UserPage { count, rows })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, email, address, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.email)
            .bind(user.address.as_deref())
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(super::map_insert_error)
    }

    async fn update_role(
        &self,
        id: UserId,
        role: UserRole,
    ) -> Result<PublicUser, RepositoryError> {
        let sql =
            format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {PUBLIC_COLUMNS}");
        sqlx::query_as::<_, PublicUser>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
