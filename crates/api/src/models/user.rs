//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{Email, UserId, UserRole};

/// A marketplace account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller, as carried in the access token.
///
/// Users are never deleted and roles never change after registration, so
/// the token alone identifies the caller without a database lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: UserRole,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
