//! Discount coupon.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use souq_core::CouponId;
use souq_core::pricing::{CouponTerms, DiscountType};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Decimal,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// The fields the discount rules look at.
    #[must_use]
    pub fn terms(&self) -> CouponTerms {
        CouponTerms {
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_purchase: self.min_purchase,
            max_uses: self.max_uses,
            used_count: self.used_count,
            expires_at: self.expires_at,
            active: self.active,
        }
    }
}
