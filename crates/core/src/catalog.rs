//! Product listing order.
//!
//! Listings are sorted in memory after the filtered query returns, because
//! the `rating` order depends on review aggregates computed per request.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Price;

/// `sort_by` values accepted by the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// Highest average rating first, ties broken by review count.
    Rating,
}

/// The fields a listing is sorted on.
pub trait SortKeys {
    fn price(&self) -> Price;
    fn created_at(&self) -> DateTime<Utc>;
    fn average_rating(&self) -> f64;
    fn review_count(&self) -> i64;
}

impl ProductSort {
    /// Sort `items` in place. Equal keys fall back to newest first.
    pub fn apply<T: SortKeys>(self, items: &mut [T]) {
        items.sort_by(|a, b| {
            self.compare(a, b)
                .then_with(|| b.created_at().cmp(&a.created_at()))
        });
    }

    fn compare<T: SortKeys>(self, a: &T, b: &T) -> Ordering {
        match self {
            Self::Newest => b.created_at().cmp(&a.created_at()),
            Self::PriceLow => a.price().cmp(&b.price()),
            Self::PriceHigh => b.price().cmp(&a.price()),
            Self::Rating => b
                .average_rating()
                .total_cmp(&a.average_rating())
                .then_with(|| b.review_count().cmp(&a.review_count())),
        }
    }
}
