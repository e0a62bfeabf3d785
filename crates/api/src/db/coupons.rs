//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use souq_core::CouponId;
use souq_core::pricing::DiscountType;

use super::{RepositoryError, conflict_on_unique};
use crate::models::Coupon;

pub(crate) const COUPON_COLUMNS: &str = "id, code, discount_type, discount_value, min_purchase, \
     max_uses, used_count, expires_at, active, created_at";

/// Fields for a new coupon. `code` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Decimal,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, new: &NewCoupon) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            r"
            INSERT INTO coupons
                (id, code, discount_type, discount_value, min_purchase, max_uses,
                 expires_at, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(CouponId::new())
        .bind(&new.code)
        .bind(new.discount_type)
        .bind(new.discount_value)
        .bind(new.min_purchase)
        .bind(new.max_uses)
        .bind(new.expires_at)
        .bind(new.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "coupon code"))
    }

    /// All coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(coupons)
    }

    /// Look up a coupon by its normalized code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(coupon)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon does not exist.
    pub async fn deactivate(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE coupons SET active = false WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
