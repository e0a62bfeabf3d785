//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use souq_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, StoreId, UserId};

/// Snapshot of a cart line taken at checkout.
///
/// Later price or name changes to the product do not affect placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub product_name: String,
    pub price: Price,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub items: Json<Vec<OrderItem>>,
    pub original_total: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Stores that supplied at least one line of this order.
    pub fn store_ids(&self) -> impl Iterator<Item = StoreId> + '_ {
        self.items.0.iter().map(|item| item.store_id)
    }
}
