//! Non-negative decimal prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("price cannot have more than {max} decimal places")]
    TooPrecise {
        /// Maximum allowed scale.
        max: u32,
    },
    #[error("price cannot exceed {max}")]
    TooLarge {
        /// Largest storable amount.
        max: Decimal,
    },
}

/// A catalog price in the store's currency.
///
/// Always `>= 0` and at most [`Price::MAX`], with at most two decimal places.
/// Serialized as a decimal string (`"49.99"`); JSON numbers are accepted on
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of decimal places.
    pub const MAX_SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// 9,999,999,999.99, the largest value a `NUMERIC(12, 2)` column holds.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Validate a decimal amount as a price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the amount is negative, too precise or
    /// above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge { max: Self::MAX.0 });
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }
        Ok(Self(normalized))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Price multiplied by a line quantity.
    #[must_use]
    pub fn line_total(self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
