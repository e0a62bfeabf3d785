//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time. The API never applies them on start-up.

use super::{CommandError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
