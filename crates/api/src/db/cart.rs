//! Cart repository. One row per (user, product).

use sqlx::PgPool;

use souq_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// Returns the resulting line quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        let total: i32 = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    /// Cart lines joined to their products, oldest first.
    ///
    /// Lines whose product was deleted are already gone through the cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT p.id, p.store_id, p.category_id, p.name, p.description, p.price,
                   p.images, p.stock, p.status, p.sizes, p.colors, p.shoe_sizes,
                   p.created_at, c.quantity
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
