//! Authentication error types.

use thiserror::Error;

use souq_core::password_reset::ResetRejection;

use crate::db::RepositoryError;
use crate::services::email::EmailError as SendEmailError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] souq_core::EmailError),

    /// Wrong password or unknown email.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    /// Password too short.
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    /// Registration asked for a role users cannot give themselves.
    #[error("Cannot self-register as admin")]
    RoleNotAllowed,

    #[error("name cannot be empty")]
    EmptyName,

    #[error(transparent)]
    Reset(#[from] ResetRejection),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("email delivery failed: {0}")]
    Email(#[from] SendEmailError),

    #[error("password hashing error")]
    PasswordHash,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
