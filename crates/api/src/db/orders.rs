//! Order repository.
//!
//! Placing an order is a single transaction: the customer's cart rows and the
//! coupon row are locked, totals are computed from live product prices, the
//! coupon is redeemed, the order is written and the cart is cleared. Any
//! failure rolls all of it back. Stock is informational and is not decremented.

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;

use souq_core::pricing::{CouponRejection, OrderTotals, TotalTooLarge};
use souq_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, StoreId, UserId};

use super::RepositoryError;
use super::coupons::COUPON_COLUMNS;
use crate::models::{Coupon, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, customer_id, items, original_total, discount, total_amount, \
     coupon_code, status, shipping_address, phone, payment_method, created_at";

/// Why an order could not be placed.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid coupon code")]
    CouponNotFound,

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    #[error(transparent)]
    TotalTooLarge(#[from] TotalTooLarge),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Checkout details supplied by the customer.
#[derive(Debug, Clone)]
pub struct PlaceOrder<'a> {
    pub customer_id: UserId,
    pub shipping_address: &'a str,
    pub phone: &'a str,
    pub payment_method: PaymentMethod,
    /// Normalized (trimmed, upper-case) coupon code.
    pub coupon_code: Option<&'a str>,
}

#[derive(sqlx::FromRow)]
struct CartSnapshotRow {
    product_id: ProductId,
    store_id: StoreId,
    name: String,
    price: Price,
    quantity: i32,
}

impl CartSnapshotRow {
    fn into_item(self) -> Result<OrderItem, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "cart quantity {} for product {}",
                self.quantity, self.product_id
            ))
        })?;
        Ok(OrderItem {
            product_id: self.product_id,
            store_id: self.store_id,
            product_name: self.name,
            price: self.price,
            quantity,
        })
    }
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the customer's cart into an order.
    ///
    /// Lines whose product is inactive, or whose store is not approved, are
    /// skipped and removed with the rest of the cart.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::EmptyCart` if nothing orderable is in the
    /// cart, `CouponNotFound`/`Coupon` if the coupon cannot be applied,
    /// `TotalTooLarge` if the totals do not fit the money columns, or
    /// `Repository` on database failure. Nothing is written on error.
    pub async fn place(&self, request: &PlaceOrder<'_>) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, CartSnapshotRow>(
            r"
            SELECT p.id AS product_id, p.store_id, p.name, p.price, c.quantity
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            JOIN stores s ON s.id = p.store_id
            WHERE c.user_id = $1 AND p.status = 'active' AND s.status = 'approved'
            ORDER BY c.added_at
            FOR UPDATE OF c
            ",
        )
        .bind(request.customer_id)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Err(PlaceOrderError::EmptyCart);
        }

        let items = rows
            .into_iter()
            .map(CartSnapshotRow::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        let lines = || items.iter().map(|item| (item.price, item.quantity));
        let subtotal = OrderTotals::compute(lines(), rust_decimal::Decimal::ZERO)?.original_total;

        let discount = match request.coupon_code {
            Some(code) => {
                let coupon = sqlx::query_as::<_, Coupon>(&format!(
                    "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1 FOR UPDATE"
                ))
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(PlaceOrderError::CouponNotFound)?;

                let discount = coupon.terms().evaluate(subtotal, Utc::now())?;

                sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = $1")
                    .bind(coupon.id)
                    .execute(&mut *tx)
                    .await?;

                discount
            }
            None => rust_decimal::Decimal::ZERO,
        };

        let totals = OrderTotals::compute(lines(), discount)?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders
                (id, customer_id, items, original_total, discount, total_amount,
                 coupon_code, shipping_address, phone, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(OrderId::new())
        .bind(request.customer_id)
        .bind(Json(&items))
        .bind(totals.original_total)
        .bind(totals.discount)
        .bind(totals.total_amount)
        .bind(request.coupon_code)
        .bind(request.shipping_address)
        .bind(request.phone)
        .bind(request.payment_method)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(request.customer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders containing at least one line from a store owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders o
            WHERE EXISTS (
                SELECT 1
                FROM jsonb_array_elements(o.items) AS item
                JOIN stores s ON s.id = (item ->> 'store_id')::uuid
                WHERE s.owner_id = $1
            )
            ORDER BY o.created_at DESC
            "
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Whether `owner_id` owns any of the given stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owns_any_store(
        &self,
        owner_id: UserId,
        store_ids: &[StoreId],
    ) -> Result<bool, RepositoryError> {
        if store_ids.is_empty() {
            return Ok(false);
        }
        let owns: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM stores WHERE owner_id = $1 AND id = ANY($2))",
        )
        .bind(owner_id)
        .bind(store_ids)
        .fetch_one(self.pool)
        .await?;

        Ok(owns)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
