//! Store repository.

use sqlx::PgPool;

use souq_core::{StoreId, StoreStatus, UserId};

use super::RepositoryError;
use crate::models::Store;

const STORE_COLUMNS: &str =
    "id, owner_id, store_name, description, phone, logo, status, created_at";

/// Fields for a new store.
#[derive(Debug)]
pub struct NewStore<'a> {
    pub owner_id: UserId,
    pub store_name: &'a str,
    pub description: &'a str,
    pub phone: Option<&'a str>,
    pub logo: Option<&'a str>,
}

pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a store in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewStore<'_>) -> Result<Store, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            r"
            INSERT INTO stores (id, owner_id, store_name, description, phone, logo, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(StoreId::new())
        .bind(new.owner_id)
        .bind(new.store_name)
        .bind(new.description)
        .bind(new.phone)
        .bind(new.logo)
        .fetch_one(self.pool)
        .await?;

        Ok(store)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// All stores, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<StoreStatus>) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            r"
            SELECT {STORE_COLUMNS} FROM stores
            WHERE ($1::store_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Stores owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// The owner's earliest approved store, used when a product names none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_approved_for_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            r"
            SELECT {STORE_COLUMNS} FROM stores
            WHERE owner_id = $1 AND status = 'approved'
            ORDER BY created_at
            LIMIT 1
            "
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// Set a store's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn set_status(
        &self,
        id: StoreId,
        status: StoreStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE stores SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a store and every product it lists, atomically.
    ///
    /// Returns the number of products removed. Cart, wishlist and review rows
    /// for those products go with them through `ON DELETE CASCADE`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (and deletes nothing) if the store
    /// does not exist.
    pub async fn delete_with_products(&self, id: StoreId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the store row so no product can be added to it mid-delete.
        let locked: Option<StoreId> =
            sqlx::query_scalar("SELECT id FROM stores WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let products_deleted = sqlx::query("DELETE FROM products WHERE store_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(products_deleted)
    }

    /// Stores whose name contains `pattern` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&self, pattern: &str) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            r"
            SELECT {STORE_COLUMNS} FROM stores
            WHERE store_name ILIKE '%' || $1 || '%' ESCAPE '\'
            ORDER BY created_at
            "
        ))
        .bind(super::escape_like(pattern))
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }
}
