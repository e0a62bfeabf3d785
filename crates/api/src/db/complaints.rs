//! Complaint repository.

use sqlx::PgPool;

use souq_core::{ComplaintId, ComplaintStatus, OrderId, UserId};

use super::RepositoryError;
use crate::models::Complaint;

const COMPLAINT_SELECT: &str = r"
    SELECT c.id, c.user_id, u.name AS user_name, c.order_id, c.subject, c.message,
           c.images, c.status, c.admin_response, c.created_at, c.updated_at
    FROM complaints c
    JOIN users u ON u.id = c.user_id
";

/// Fields for a new complaint.
#[derive(Debug)]
pub struct NewComplaint<'a> {
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub subject: &'a str,
    pub message: &'a str,
    pub images: &'a [String],
}

pub struct ComplaintRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ComplaintRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a complaint in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewComplaint<'_>) -> Result<Complaint, RepositoryError> {
        let id = ComplaintId::new();
        sqlx::query(
            r"
            INSERT INTO complaints (id, user_id, order_id, subject, message, images)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(new.user_id)
        .bind(new.order_id)
        .bind(new.subject)
        .bind(new.message)
        .bind(new.images)
        .execute(self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("complaint {id} vanished")))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        let complaint =
            sqlx::query_as::<_, Complaint>(&format!("{COMPLAINT_SELECT} WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(complaint)
    }

    /// A user's complaints, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_user(&self, user_id: UserId) -> Result<Vec<Complaint>, RepositoryError> {
        let complaints = sqlx::query_as::<_, Complaint>(&format!(
            "{COMPLAINT_SELECT} WHERE c.user_id = $1 ORDER BY c.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(complaints)
    }

    /// Every complaint, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<Complaint>, RepositoryError> {
        let complaints = sqlx::query_as::<_, Complaint>(&format!(
            r"
            {COMPLAINT_SELECT}
            WHERE ($1::complaint_status IS NULL OR c.status = $1)
            ORDER BY c.created_at DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(complaints)
    }

    /// Move a complaint along and/or set the admin response. `None` leaves
    /// the column unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the complaint does not exist.
    pub async fn respond(
        &self,
        id: ComplaintId,
        status: Option<ComplaintStatus>,
        admin_response: Option<&str>,
    ) -> Result<Complaint, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE complaints SET
                status         = COALESCE($2, status),
                admin_response = COALESCE($3, admin_response),
                updated_at     = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .bind(admin_response)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
