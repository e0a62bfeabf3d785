use sqlx::PgPool;

use souq_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Product;

pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product. Adding it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO wishlist_items (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a product. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Wishlisted products, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT p.id, p.store_id, p.category_id, p.name, p.description, p.price,
                   p.images, p.stock, p.status, p.sizes, p.colors, p.shoe_sizes,
                   p.created_at
            FROM wishlist_items w
            JOIN products p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.added_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }
}
