//! Coupon rules and order totals.
//!
//! Everything here is pure arithmetic over values already loaded from the
//! database, so checkout and `POST /coupons/validate` share one set of rules.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Price;

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "discount_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percent off the subtotal, in (0, 100].
    Percentage,
    /// Flat amount off the subtotal.
    Fixed,
}

/// Why a coupon cannot be applied to an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    #[error("Coupon is not active")]
    Inactive,
    #[error("Coupon has expired")]
    Expired,
    #[error("Coupon usage limit reached")]
    UsageLimitReached,
    #[error("Minimum purchase of {minimum} required for this coupon")]
    BelowMinimum {
        /// The coupon's `min_purchase`.
        minimum: Decimal,
    },
}

/// A coupon definition that breaks the discount rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponDefinitionError {
    #[error("coupon code cannot be empty")]
    EmptyCode,
    #[error("percentage discount must be greater than 0 and at most 100")]
    PercentageOutOfRange,
    #[error("fixed discount must be greater than 0")]
    NonPositiveFixed,
    #[error("minimum purchase cannot be negative")]
    NegativeMinimum,
    #[error("max uses must be at least 1")]
    ZeroMaxUses,
    #[error("discount value and minimum purchase cannot exceed {max}")]
    AmountTooLarge {
        /// Largest storable amount.
        max: Decimal,
    },
}

/// An order whose totals do not fit the money columns.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Order total cannot exceed {max}")]
pub struct TotalTooLarge {
    /// Largest storable amount.
    pub max: Decimal,
}

/// The parts of a stored coupon that decide whether it applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponTerms {
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_purchase: Decimal,
    /// `None` means unlimited.
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl CouponTerms {
    /// Check the coupon against an order subtotal and return the discount.
    ///
    /// The discount never exceeds the subtotal.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponRejection`] that applies, checked in the
    /// order: inactive, expired, usage cap, minimum purchase.
    pub fn evaluate(
        &self,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }
        if self.expires_at.is_some_and(|at| at <= now) {
            return Err(CouponRejection::Expired);
        }
        if self.max_uses.is_some_and(|max| self.used_count >= max) {
            return Err(CouponRejection::UsageLimitReached);
        }
        if subtotal < self.min_purchase {
            return Err(CouponRejection::BelowMinimum {
                minimum: self.min_purchase,
            });
        }
        Ok(discount_amount(
            self.discount_type,
            self.discount_value,
            subtotal,
        ))
    }
}

/// Discount for `subtotal`, rounded to cents and capped at the subtotal.
#[must_use]
pub fn discount_amount(discount_type: DiscountType, value: Decimal, subtotal: Decimal) -> Decimal {
    let raw = match discount_type {
        DiscountType::Percentage => subtotal * value / Decimal::ONE_HUNDRED,
        DiscountType::Fixed => value,
    };
    raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO))
}

/// Normalize a coupon code for storage and lookup.
#[must_use]
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Validate the fields of a new coupon.
///
/// # Errors
///
/// Returns [`CouponDefinitionError`] for the first invalid field.
pub fn validate_coupon_definition(
    code: &str,
    discount_type: DiscountType,
    discount_value: Decimal,
    min_purchase: Decimal,
    max_uses: Option<i32>,
) -> Result<(), CouponDefinitionError> {
    if code.trim().is_empty() {
        return Err(CouponDefinitionError::EmptyCode);
    }
    match discount_type {
        DiscountType::Percentage
            if discount_value <= Decimal::ZERO || discount_value > Decimal::ONE_HUNDRED =>
        {
            return Err(CouponDefinitionError::PercentageOutOfRange);
        }
        DiscountType::Fixed if discount_value <= Decimal::ZERO => {
            return Err(CouponDefinitionError::NonPositiveFixed);
        }
        _ => {}
    }
    if min_purchase < Decimal::ZERO {
        return Err(CouponDefinitionError::NegativeMinimum);
    }
    if max_uses.is_some_and(|max| max < 1) {
        return Err(CouponDefinitionError::ZeroMaxUses);
    }
    let max = Price::MAX.amount();
    if discount_value > max || min_purchase > max {
        return Err(CouponDefinitionError::AmountTooLarge { max });
    }
    Ok(())
}

/// Money summary of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of price times quantity over every line.
    pub original_total: Decimal,
    /// Applied discount.
    pub discount: Decimal,
    /// `original_total - discount`, never below zero.
    pub total_amount: Decimal,
}

impl OrderTotals {
    /// Total the lines and subtract the discount, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns [`TotalTooLarge`] if the line total exceeds [`Price::MAX`].
    pub fn compute<I>(lines: I, discount: Decimal) -> Result<Self, TotalTooLarge>
    where
        I: IntoIterator<Item = (Price, u32)>,
    {
        let original_total = subtotal(lines);
        let max = Price::MAX.amount();
        if original_total > max {
            return Err(TotalTooLarge { max });
        }
        let discount = discount.clamp(Decimal::ZERO, original_total);
        Ok(Self {
            original_total,
            discount,
            total_amount: original_total - discount,
        })
    }
}

/// Sum of price times quantity.
pub fn subtotal<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Price, u32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| price.line_total(quantity))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn price(s: &str) -> Price {
        Price::new(dec(s)).unwrap()
    }

    fn terms(discount_type: DiscountType, value: &str) -> CouponTerms {
        CouponTerms {
            discount_type,
            discount_value: dec(value),
            min_purchase: Decimal::ZERO,
            max_uses: None,
            used_count: 0,
            expires_at: None,
            active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let coupon = terms(DiscountType::Percentage, "10");
        assert_eq!(coupon.evaluate(dec("250"), Utc::now()), Ok(dec("25")));
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        let coupon = terms(DiscountType::Percentage, "15");
        assert_eq!(coupon.evaluate(dec("9.99"), Utc::now()), Ok(dec("1.50")));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let coupon = terms(DiscountType::Fixed, "100");
        assert_eq!(coupon.evaluate(dec("40"), Utc::now()), Ok(dec("40")));
    }

    #[test]
    fn test_inactive_coupon_rejected() {
        let mut coupon = terms(DiscountType::Fixed, "5");
        coupon.active = false;
        assert_eq!(
            coupon.evaluate(dec("40"), Utc::now()),
            Err(CouponRejection::Inactive)
        );
    }

    #[test]
    fn test_expired_coupon_rejected() {
        let now = Utc::now();
        let mut coupon = terms(DiscountType::Fixed, "5");
        coupon.expires_at = Some(now - Duration::minutes(1));
        assert_eq!(coupon.evaluate(dec("40"), now), Err(CouponRejection::Expired));

        coupon.expires_at = Some(now + Duration::days(1));
        assert!(coupon.evaluate(dec("40"), now).is_ok());
    }

    #[test]
    fn test_exhausted_coupon_rejected() {
        let mut coupon = terms(DiscountType::Fixed, "5");
        coupon.max_uses = Some(3);
        coupon.used_count = 3;
        assert_eq!(
            coupon.evaluate(dec("40"), Utc::now()),
            Err(CouponRejection::UsageLimitReached)
        );

        coupon.used_count = 2;
        assert!(coupon.evaluate(dec("40"), Utc::now()).is_ok());
    }

    #[test]
    fn test_below_minimum_rejected() {
        let mut coupon = terms(DiscountType::Percentage, "20");
        coupon.min_purchase = dec("100");
        assert_eq!(
            coupon.evaluate(dec("99.99"), Utc::now()),
            Err(CouponRejection::BelowMinimum {
                minimum: dec("100")
            })
        );
        assert_eq!(coupon.evaluate(dec("100"), Utc::now()), Ok(dec("20")));
    }

    fn definition(
        code: &str,
        discount_type: DiscountType,
        value: &str,
        min_purchase: &str,
        max_uses: Option<i32>,
    ) -> Result<(), CouponDefinitionError> {
        validate_coupon_definition(code, discount_type, dec(value), dec(min_purchase), max_uses)
    }

    #[test]
    fn test_definition_validation() {
        let ok = definition("SAVE10", DiscountType::Percentage, "10", "0", Some(5));
        assert!(ok.is_ok());

        assert_eq!(
            definition("  ", DiscountType::Fixed, "1", "0", None),
            Err(CouponDefinitionError::EmptyCode)
        );
        assert_eq!(
            definition("X", DiscountType::Percentage, "100.5", "0", None),
            Err(CouponDefinitionError::PercentageOutOfRange)
        );
        assert_eq!(
            definition("X", DiscountType::Fixed, "0", "0", None),
            Err(CouponDefinitionError::NonPositiveFixed)
        );
        assert_eq!(
            definition("X", DiscountType::Fixed, "1", "-1", None),
            Err(CouponDefinitionError::NegativeMinimum)
        );
        assert_eq!(
            definition("X", DiscountType::Fixed, "1", "0", Some(0)),
            Err(CouponDefinitionError::ZeroMaxUses)
        );
    }

    #[test]
    fn test_definition_amounts_fit_money_columns() {
        let max = Price::MAX.amount();
        assert!(definition("BIG", DiscountType::Fixed, "9999999999.99", "0", None).is_ok());
        assert_eq!(
            definition("BIG", DiscountType::Fixed, "10000000000", "0", None),
            Err(CouponDefinitionError::AmountTooLarge { max })
        );
        assert_eq!(
            definition("BIG", DiscountType::Percentage, "10", "10000000000", None),
            Err(CouponDefinitionError::AmountTooLarge { max })
        );
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_coupon_code("  welcome10 "), "WELCOME10");
    }

    #[test]
    fn test_order_totals() {
        let totals =
            OrderTotals::compute([(price("50000"), 1), (price("12.50"), 2)], dec("25")).unwrap();
        assert_eq!(totals.original_total, dec("50025"));
        assert_eq!(totals.discount, dec("25"));
        assert_eq!(totals.total_amount, dec("50000"));
    }

    #[test]
    fn test_order_totals_clamped_at_zero() {
        let totals = OrderTotals::compute([(price("10"), 1)], dec("15")).unwrap();
        assert_eq!(totals.discount, dec("10"));
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_order_totals_beyond_column_range_rejected() {
        let line = (price("9000000000"), 2);
        assert_eq!(
            OrderTotals::compute([line], Decimal::ZERO),
            Err(TotalTooLarge {
                max: Price::MAX.amount()
            })
        );
        assert!(OrderTotals::compute([(Price::MAX, 1)], Decimal::ZERO).is_ok());
    }
}
