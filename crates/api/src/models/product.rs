//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::catalog::SortKeys;
use souq_core::{CategoryId, Price, ProductId, ProductStatus, StoreId};

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub stock: i32,
    pub status: ProductStatus,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub shoe_sizes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A product with its review aggregate, as returned by listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    /// Mean rating, `0.0` when there are no reviews.
    pub average_rating: f64,
    pub review_count: i64,
}

impl SortKeys for ProductListing {
    fn price(&self) -> Price {
        self.product.price
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.product.created_at
    }

    fn average_rating(&self) -> f64 {
        self.average_rating
    }

    fn review_count(&self) -> i64 {
        self.review_count
    }
}
