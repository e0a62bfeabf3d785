//! Hosted checkout transaction record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use souq_core::{PaymentStatus, PaymentTransactionId, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub id: PaymentTransactionId,
    pub session_id: String,
    pub user_id: UserId,
    pub package_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_status: PaymentStatus,
    /// Provider session status (`open`, `complete`, `expired`).
    pub status: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
