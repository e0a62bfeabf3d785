//! Password reset code storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use souq_core::Email;
use souq_core::password_reset::ResetCodeState;

use super::RepositoryError;

/// The newest reset code issued for an email.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResetCodeRow {
    pub id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl ResetCodeRow {
    #[must_use]
    pub fn state(&self) -> ResetCodeState {
        ResetCodeState {
            code: self.code.clone(),
            expires_at: self.expires_at,
            used: self.used,
        }
    }
}

/// Outcome of trying to consume a reset code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Code marked used and password replaced.
    Consumed,
    /// Another request consumed the code first.
    AlreadyUsed,
}

pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new code for `email`, deleting any earlier codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn replace(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM password_resets WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO password_resets (id, email, code, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Latest code issued for `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, email: &Email) -> Result<Option<ResetCodeRow>, RepositoryError> {
        let row = sqlx::query_as::<_, ResetCodeRow>(
            r"
            SELECT id, code, expires_at, used
            FROM password_resets
            WHERE email = $1
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Mark the code used and set the new password hash in one transaction.
    ///
    /// The `used = false` guard makes the code single-use under concurrent
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account vanished, or
    /// `RepositoryError::Database` if the transaction fails.
    pub async fn consume(
        &self,
        reset_id: Uuid,
        email: &Email,
        password_hash: &str,
    ) -> Result<ConsumeOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE password_resets SET used = true WHERE id = $1 AND used = false",
        )
        .bind(reset_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Ok(ConsumeOutcome::AlreadyUsed);
        }

        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE email = $1",
        )
        .bind(email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(ConsumeOutcome::Consumed)
    }
}
