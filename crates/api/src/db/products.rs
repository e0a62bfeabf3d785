//! Product repository.
//!
//! Listings join a per-product review aggregate on every call; nothing is
//! cached. Ordering is applied afterwards with [`ProductSort::apply`].
//!
//! Shoppers only see active products of approved stores. Rejecting or
//! un-approving a store hides its catalog without deleting it.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use souq_core::catalog::ProductSort;
use souq_core::{CategoryId, Price, ProductId, ProductStatus, StoreId};

use super::{RepositoryError, escape_like};
use crate::models::{Product, ProductListing};

const PRODUCT_COLUMNS: &str = "p.id, p.store_id, p.category_id, p.name, p.description, p.price, \
     p.images, p.stock, p.status, p.sizes, p.colors, p.shoe_sizes, p.created_at";

/// Products a shopper may browse and buy.
const VISIBLE: &str = "p.status = 'active' AND s.status = 'approved'";

const LISTING_FROM: &str = r"
    FROM products p
    JOIN stores s ON s.id = p.store_id
    LEFT JOIN (
        SELECT product_id,
               AVG(rating)::float8 AS average_rating,
               COUNT(*) AS review_count
        FROM reviews
        GROUP BY product_id
    ) r ON r.product_id = p.id
";

/// Most rows returned by [`ProductRepository::similar`].
pub const MAX_SIMILAR: i64 = 24;

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub store_id: Option<StoreId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort: ProductSort,
}

/// Editable product fields. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub shoe_sizes: Option<Vec<String>>,
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub store_id: StoreId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub shoe_sizes: Vec<String>,
}

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

fn listing_select() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!(
        "SELECT {PRODUCT_COLUMNS}, \
         COALESCE(r.average_rating, 0)::float8 AS average_rating, \
         COALESCE(r.review_count, 0) AS review_count {LISTING_FROM}"
    ))
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Visible products matching `filter`, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let mut qb = listing_select();
        qb.push(" WHERE ").push(VISIBLE);

        if let Some(category_id) = filter.category_id {
            qb.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(store_id) = filter.store_id {
            qb.push(" AND p.store_id = ").push_bind(store_id);
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND p.price <= ").push_bind(max);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR p.description ILIKE ")
                .push_bind(pattern)
                .push(r" ESCAPE '\')");
        }

        let mut listings = qb
            .build_query_as::<ProductListing>()
            .fetch_all(self.pool)
            .await?;

        filter.sort.apply(&mut listings);
        Ok(listings)
    }

    /// A product with its rating aggregate, whatever its or its store's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductListing>, RepositoryError> {
        let mut qb = listing_select();
        qb.push(" WHERE p.id = ").push_bind(id);

        let listing = qb
            .build_query_as::<ProductListing>()
            .fetch_optional(self.pool)
            .await?;

        Ok(listing)
    }

    /// A visible product, without the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p JOIN stores s ON s.id = p.store_id \
             WHERE p.id = $1 AND {VISIBLE}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Other visible products in the same category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn similar(
        &self,
        id: ProductId,
        limit: i64,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let category_id: Option<CategoryId> =
            sqlx::query_scalar("SELECT category_id FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        let category_id = category_id.ok_or(RepositoryError::NotFound)?;

        let mut qb = listing_select();
        qb.push(" WHERE ")
            .push(VISIBLE)
            .push(" AND p.category_id = ")
            .push_bind(category_id)
            .push(" AND p.id <> ")
            .push_bind(id)
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(limit.clamp(1, MAX_SIMILAR));

        let listings = qb
            .build_query_as::<ProductListing>()
            .fetch_all(self.pool)
            .await?;

        Ok(listings)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products AS p
                (id, store_id, category_id, name, description, price, images, stock,
                 sizes, colors, shoe_sizes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::new())
        .bind(new.store_id)
        .bind(new.category_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.images)
        .bind(new.stock)
        .bind(&new.sizes)
        .bind(&new.colors)
        .bind(&new.shoe_sizes)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Apply `changes` and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products AS p SET
                category_id = COALESCE($2, category_id),
                name        = COALESCE($3, name),
                description = COALESCE($4, description),
                price       = COALESCE($5, price),
                images      = COALESCE($6, images),
                stock       = COALESCE($7, stock),
                status      = COALESCE($8, status),
                sizes       = COALESCE($9, sizes),
                colors      = COALESCE($10, colors),
                shoe_sizes  = COALESCE($11, shoe_sizes),
                updated_at  = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.category_id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price)
        .bind(changes.images.as_deref())
        .bind(changes.stock)
        .bind(changes.status)
        .bind(changes.sizes.as_deref())
        .bind(changes.colors.as_deref())
        .bind(changes.shoe_sizes.as_deref())
        .fetch_optional(self.pool)
        .await?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether a store already lists a product with this name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_in_store(
        &self,
        store_id: StoreId,
        name: &str,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE store_id = $1 AND name = $2)",
        )
        .bind(store_id)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
