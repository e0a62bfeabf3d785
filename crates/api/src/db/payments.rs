//! Payment transaction repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use souq_core::{PaymentStatus, PaymentTransactionId, UserId};

use super::RepositoryError;
use crate::models::PaymentTransaction;

const TRANSACTION_COLUMNS: &str = "id, session_id, user_id, package_id, amount, currency, \
     payment_status, status, metadata, created_at, updated_at";

/// A freshly created checkout session to record.
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub session_id: &'a str,
    pub user_id: UserId,
    pub package_id: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub metadata: serde_json::Value,
}

pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an unpaid, open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        new: &NewTransaction<'_>,
    ) -> Result<PaymentTransaction, RepositoryError> {
        let transaction = sqlx::query_as::<_, PaymentTransaction>(&format!(
            r"
            INSERT INTO payment_transactions
                (id, session_id, user_id, package_id, amount, currency, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TRANSACTION_COLUMNS}
            "
        ))
        .bind(PaymentTransactionId::new())
        .bind(new.session_id)
        .bind(new.user_id)
        .bind(new.package_id)
        .bind(new.amount)
        .bind(new.currency)
        .bind(&new.metadata)
        .fetch_one(self.pool)
        .await?;

        Ok(transaction)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentTransaction>, RepositoryError> {
        let transaction = sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(transaction)
    }

    /// Store the provider's latest view of a session.
    ///
    /// A transaction already marked `paid` keeps that status. Returns `true`
    /// only for the call that moved it to `paid`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn record_status(
        &self,
        session_id: &str,
        status: &str,
        payment_status: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            r"
            UPDATE payment_transactions
            SET payment_status = $2
            WHERE session_id = $1 AND payment_status <> 'paid' AND payment_status <> $2
            ",
        )
        .bind(session_id)
        .bind(payment_status)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            "UPDATE payment_transactions SET status = $2, updated_at = now() WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(moved > 0 && payment_status == PaymentStatus::Paid)
    }

    /// Mark a session paid. Returns `false` if it was already paid or unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_paid(&self, session_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE payment_transactions
            SET payment_status = 'paid', status = 'complete', updated_at = now()
            WHERE session_id = $1 AND payment_status <> 'paid'
            ",
        )
        .bind(session_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
