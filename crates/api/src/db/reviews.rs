//! Review repository.

use sqlx::PgPool;

use souq_core::{ProductId, Rating, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

const REVIEW_SELECT: &str = r"
    SELECT r.id, r.product_id, r.user_id, u.name AS user_name,
           r.rating, r.comment, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
";

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the
    /// product.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: Rating,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let id = ReviewId::new();
        let inserted = sqlx::query(
            r"
            INSERT INTO reviews (id, product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .execute(self.pool)
        .await;

        if let Err(sqlx::Error::Database(ref db_err)) = inserted
            && db_err.is_unique_violation()
        {
            return Err(RepositoryError::Conflict(
                "You have already reviewed this product".to_owned(),
            ));
        }
        inserted?;

        sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("review {id} vanished")))
    }

    /// Reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Reviews written by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_user(&self, user_id: UserId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }
}
