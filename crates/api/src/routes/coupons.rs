//! Coupon route handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::CouponId;
use souq_core::pricing::{DiscountType, normalize_coupon_code, validate_coupon_definition};

use super::{MessageResponse, not_found_as};
use crate::db::coupons::{CouponRepository, NewCoupon};
use crate::error::{AppError, capitalize};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Coupon, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_purchase: Decimal,
    /// `None` means unlimited.
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub code: String,
    pub discount: Decimal,
    pub final_total: Decimal,
}

#[instrument(skip(state, admin, form), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(form): ApiJson<CreateCouponRequest>,
) -> Result<Json<Coupon>, AppError> {
    validate_coupon_definition(
        &form.code,
        form.discount_type,
        form.discount_value,
        form.min_purchase,
        form.max_uses,
    )
    .map_err(|e| AppError::BadRequest(capitalize(&e.to_string())))?;

    let coupon = CouponRepository::new(state.pool())
        .create(&NewCoupon {
            code: normalize_coupon_code(&form.code),
            discount_type: form.discount_type,
            discount_value: form.discount_value,
            min_purchase: form.min_purchase,
            max_uses: form.max_uses,
            expires_at: form.expires_at,
            active: form.active,
        })
        .await?;

    tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
    Ok(Json(coupon))
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Coupon>>, AppError> {
    let coupons = CouponRepository::new(state.pool()).list().await?;
    Ok(Json(coupons))
}

/// Price `total` with a coupon without redeeming it.
#[instrument(skip(state, form))]
pub async fn validate(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, AppError> {
    if form.total < Decimal::ZERO {
        return Err(AppError::BadRequest("Total cannot be negative".to_owned()));
    }

    let code = normalize_coupon_code(&form.code);
    let coupon = CouponRepository::new(state.pool())
        .find_by_code(&code)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid coupon code".to_owned()))?;

    let discount = coupon.terms().evaluate(form.total, Utc::now())?;

    Ok(Json(ValidateCouponResponse {
        valid: true,
        code: coupon.code,
        discount,
        final_total: form.total - discount,
    }))
}

/// Deactivate a coupon. Orders that used it keep their snapshot.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CouponId>,
) -> Result<Json<MessageResponse>, AppError> {
    CouponRepository::new(state.pool())
        .deactivate(id)
        .await
        .map_err(|e| not_found_as("Coupon", e))?;

    tracing::info!(coupon_id = %id, "Coupon deactivated");
    Ok(Json(MessageResponse::new("Coupon deactivated")))
}
