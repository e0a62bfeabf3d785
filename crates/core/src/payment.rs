//! Server-side payment package table.
//!
//! Checkout requests name a package; the charged amount always comes from
//! this table, never from the request body.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// ISO 4217 currency code, lower-case on the wire as the payment provider
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    Usd,
}

impl CurrencyCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "usd",
        }
    }

    /// Number of minor units per major unit.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        match self {
            Self::Usd => 100,
        }
    }
}

/// A purchasable package with a fixed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentPackage {
    pub id: &'static str,
    pub name: &'static str,
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl PaymentPackage {
    /// Amount in the currency's minor unit (cents), as the provider expects.
    #[must_use]
    pub fn amount_minor(&self) -> i64 {
        let minor = self.amount * Decimal::from(self.currency.minor_units());
        minor.trunc().to_i64().unwrap_or(i64::MAX)
    }
}

/// All packages offered at checkout.
pub const PACKAGES: &[PaymentPackage] = &[
    PaymentPackage {
        id: "basic",
        name: "Basic",
        amount: Decimal::from_parts(999, 0, 0, false, 2),
        currency: CurrencyCode::Usd,
    },
    PaymentPackage {
        id: "standard",
        name: "Standard",
        amount: Decimal::from_parts(2499, 0, 0, false, 2),
        currency: CurrencyCode::Usd,
    },
    PaymentPackage {
        id: "premium",
        name: "Premium",
        amount: Decimal::from_parts(4999, 0, 0, false, 2),
        currency: CurrencyCode::Usd,
    },
];

/// Look up a package by its identifier.
#[must_use]
pub fn find_package(id: &str) -> Option<&'static PaymentPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_find_known_packages() {
        let basic = find_package("basic").unwrap();
        assert_eq!(basic.amount, Decimal::from_str("9.99").unwrap());
        assert_eq!(basic.amount_minor(), 999);

        let premium = find_package("premium").unwrap();
        assert_eq!(premium.amount_minor(), 4999);
    }

    #[test]
    fn test_unknown_package() {
        assert!(find_package("enterprise").is_none());
        assert!(find_package("BASIC").is_none());
    }

    #[test]
    fn test_package_ids_unique() {
        for (i, a) in PACKAGES.iter().enumerate() {
            for b in PACKAGES.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_currency_wire_format() {
        assert_eq!(CurrencyCode::Usd.as_str(), "usd");
        assert_eq!(serde_json::to_string(&CurrencyCode::Usd).unwrap(), "\"usd\"");
    }
}
