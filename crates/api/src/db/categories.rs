//! Category repository.

use sqlx::PgPool;

use souq_core::CategoryId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::Category;

/// Fields for a new category.
#[derive(Debug, Clone)]
pub struct NewCategory<'a> {
    pub name_ar: &'a str,
    pub name_en: &'a str,
    pub slug: &'a str,
    pub icon: &'a str,
}

pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by English name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name_ar, name_en, slug, icon FROM categories ORDER BY name_en",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, new: &NewCategory<'_>) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (id, name_ar, name_en, slug, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name_ar, name_en, slug, icon
            ",
        )
        .bind(CategoryId::new())
        .bind(new.name_ar)
        .bind(new.name_en)
        .bind(new.slug)
        .bind(new.icon)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "slug"))
    }

    /// Insert the category, or refresh its names and icon if the slug exists.
    ///
    /// Returns the row and whether it was newly inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, new: &NewCategory<'_>) -> Result<(Category, bool), RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            category: Category,
            inserted: bool,
        }

        let row = sqlx::query_as::<_, Row>(
            r"
            INSERT INTO categories (id, name_ar, name_en, slug, icon)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE SET
                name_ar = EXCLUDED.name_ar,
                name_en = EXCLUDED.name_en,
                icon = EXCLUDED.icon
            RETURNING id, name_ar, name_en, slug, icon, (xmax = 0) AS inserted
            ",
        )
        .bind(CategoryId::new())
        .bind(new.name_ar)
        .bind(new.name_en)
        .bind(new.slug)
        .bind(new.icon)
        .fetch_one(self.pool)
        .await?;

        Ok((row.category, row.inserted))
    }
}
