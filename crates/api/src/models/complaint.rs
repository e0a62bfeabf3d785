//! Buyer complaint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{ComplaintId, ComplaintStatus, OrderId, UserId};

/// A complaint with the author's display name joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Complaint {
    pub id: ComplaintId,
    pub user_id: UserId,
    pub user_name: String,
    pub order_id: Option<OrderId>,
    pub subject: String,
    pub message: String,
    pub images: Vec<String>,
    pub status: ComplaintStatus,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
