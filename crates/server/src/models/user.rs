//! User account models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use samovar_core::{UserId, UserRole};

/// A stored account, including the password hash. Never serialized to
/// clients; convert to [`PublicUser`] first.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub email: String,
    pub role: UserRole,
}

/// The client-facing projection of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub address: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            address: user.address,
        }
    }
}

/// One page of users with the total row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub count: i64,
    pub rows: Vec<PublicUser>,
}
