//! Account creation for roles that cannot self-register.

use souq_api::services::auth::{Registration, create_account};
use souq_core::UserRole;

use super::{CommandError, connect};

/// Create an account with the given role.
///
/// # Errors
///
/// Fails if the email is malformed or taken, the password is too short, or
/// the database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: UserRole,
) -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating account: {} ({})", email, role);
    let user = create_account(
        &pool,
        &Registration {
            email,
            password,
            name,
            phone: None,
            address: None,
            role,
        },
    )
    .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
