//! Unified error handling for the API.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as JSON
//! `{"detail": "..."}` with the status codes clients rely on: 400 for bad
//! input and business rule violations, 401 for missing or bad credentials,
//! 403 for role and ownership checks, 404 for absent entities and 500 for
//! server faults, including payment provider failures.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use souq_core::pricing::CouponRejection;

use crate::db::RepositoryError;
use crate::db::orders::PlaceOrderError;
use crate::services::stripe::StripeError;
use crate::services::uploads::UploadError;
use crate::services::{AuthError, EmailError, TokenError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Stripe call failed.
    #[error("Payment provider error: {0}")]
    Payment(#[from] StripeError),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller lacks the role or ownership.
    #[error("{0}")]
    Forbidden(String),

    /// Bad input or a business rule refused the request.
    #[error("{0}")]
    BadRequest(String),

    /// An optional dependency the endpoint needs is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_)
            | Self::Payment(_)
            | Self::Email(_)
            | Self::NotConfigured(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// The text sent to the client. Server faults are not described.
    fn detail(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(what)) => capitalize(what),
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => {
                "Internal server error".to_owned()
            }
            Self::Payment(_) => "Payment provider error".to_owned(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

/// Upper-case the first character of a message.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::RoleNotAllowed => Self::Forbidden(err.to_string()),
            AuthError::InvalidEmail(_)
            | AuthError::EmailTaken
            | AuthError::WeakPassword { .. }
            | AuthError::EmptyName
            | AuthError::Reset(_) => Self::BadRequest(err.to_string()),
            AuthError::Repository(e) => Self::Database(e),
            AuthError::Email(e) => Self::Email(e),
            AuthError::Token(_) | AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => Self::Unauthorized("Invalid or expired token".to_owned()),
            TokenError::Encode(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<PlaceOrderError> for AppError {
    fn from(err: PlaceOrderError) -> Self {
        match err {
            PlaceOrderError::Repository(e) => Self::Database(e),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<CouponRejection> for AppError {
    fn from(err: CouponRejection) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use souq_core::password_reset::ResetRejection;
    use souq_core::pricing::TotalTooLarge;

    use super::*;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(AppError::not_found("Store")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(RepositoryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(RepositoryError::Conflict("slug already exists".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::DataCorruption("x".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::NotConfigured("Stripe")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Forbidden("no".to_owned())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_payment_provider_failures_are_500() {
        let err = StripeError::Api {
            status: 402,
            message: "card declined".to_owned(),
        };
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(StripeError::Request("timed out".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(StripeError::Response("bad json".to_owned())).detail(),
            "Payment provider error"
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(status_of(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::EmailTaken), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::RoleNotAllowed), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthError::Reset(ResetRejection::Expired)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AuthError::PasswordHash), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_order_error_mapping() {
        assert_eq!(status_of(PlaceOrderError::EmptyCart), StatusCode::BAD_REQUEST);
        let overflow = PlaceOrderError::TotalTooLarge(TotalTooLarge {
            max: souq_core::Price::MAX.amount(),
        });
        assert_eq!(
            AppError::from(overflow).detail(),
            "Order total cannot exceed 9999999999.99"
        );
        assert_eq!(
            status_of(PlaceOrderError::Coupon(CouponRejection::Expired)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PlaceOrderError::Repository(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_details_hide_internals() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret table".to_owned()));
        assert_eq!(err.detail(), "Internal server error");

        let err = AppError::from(RepositoryError::Conflict("slug already exists".to_owned()));
        assert_eq!(err.detail(), "Slug already exists");

        let err = AppError::from(AuthError::EmailTaken);
        assert_eq!(err.detail(), "Email already registered");

        assert_eq!(
            AppError::NotConfigured("Stripe").detail(),
            "Stripe is not configured"
        );
    }
}
