//! Shopping cart view.

use rust_decimal::Decimal;
use serde::Serialize;

use super::Product;

/// One cart line with the live product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    #[sqlx(flatten)]
    pub product: Product,
    pub quantity: i32,
}

impl CartLine {
    /// Price times quantity at the current product price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .price
            .line_total(u32::try_from(self.quantity).unwrap_or(0))
    }
}

/// Response body for `GET /cart`.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartViewLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartViewLine {
    pub product: Product,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl From<Vec<CartLine>> for CartView {
    fn from(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartViewLine> = lines
            .into_iter()
            .map(|line| CartViewLine {
                line_total: line.line_total(),
                product: line.product,
                quantity: line.quantity,
            })
            .collect();
        let total = items.iter().map(|l| l.line_total).sum();
        Self { items, total }
    }
}
