//! Product review.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{ProductId, Rating, ReviewId, UserId};

/// A review with the reviewer's display name joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
