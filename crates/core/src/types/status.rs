//! Role and lifecycle status enums.
//!
//! Each enum maps to a `PostgreSQL` enum type of the same name (with the
//! `postgres` feature) and serializes as its `snake_case` variant name, which
//! is also what `Display` and `FromStr` use. `FromStr` is what query-string
//! status parameters go through.

use serde::{Deserialize, Serialize};

/// Error returned when a status or role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Implements `as_str`, `Display` and `FromStr` from one variant table.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire and database representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError::new($kind, s)),
                }
            }
        }
    };
}

/// Account role carried in every access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shops and places orders.
    #[default]
    Customer,
    /// Runs one or more stores.
    StoreOwner,
    /// Approves stores, manages categories and coupons.
    Admin,
}

string_enum!(UserRole, "role", {
    Customer => "customer",
    StoreOwner => "store_owner",
    Admin => "admin",
});

impl UserRole {
    /// Roles that may be chosen at public registration.
    #[must_use]
    pub const fn is_self_service(self) -> bool {
        matches!(self, Self::Customer | Self::StoreOwner)
    }

    /// Whether the role may create stores and list products.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        matches!(self, Self::StoreOwner | Self::Admin)
    }
}

/// Store onboarding status.
///
/// Stores start `Pending` and are moved by an admin. Only `Approved` stores
/// may list products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

string_enum!(StoreStatus, "store status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Product visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

string_enum!(ProductStatus, "product status", {
    Active => "active",
    Inactive => "inactive",
});

/// Order fulfillment status.
///
/// Usual flow is pending, confirmed, shipped, delivered, with cancelled
/// reachable from anywhere. Admins and store owners may set any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

/// How a shopper intends to pay for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
}

string_enum!(PaymentMethod, "payment method", {
    CashOnDelivery => "cash_on_delivery",
    Card => "card",
});

/// Payment state of a hosted checkout transaction.
///
/// Mirrors the provider's `payment_status` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    NoPaymentRequired,
}

string_enum!(PaymentStatus, "payment status", {
    Unpaid => "unpaid",
    Paid => "paid",
    NoPaymentRequired => "no_payment_required",
});

/// Handling state of a buyer complaint.
///
/// New complaints are `Pending`; an admin moves them along and may attach a
/// response at any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "complaint_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Closed,
}

string_enum!(ComplaintStatus, "complaint status", {
    Pending => "pending",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

impl PaymentStatus {
    /// Whether funds have been captured (or none were due).
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }
}
