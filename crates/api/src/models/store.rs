//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{StoreId, StoreStatus, UserId};

/// A vendor storefront inside the marketplace.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: UserId,
    pub store_name: String,
    pub description: String,
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub status: StoreStatus,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Whether `user` may manage this store's products.
    #[must_use]
    pub fn is_managed_by(&self, user: &super::CurrentUser) -> bool {
        user.is_admin() || self.owner_id == user.id
    }
}
