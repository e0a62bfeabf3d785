//! Account route handlers: registration, login and password reset.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::UserRole;

use super::MessageResponse;
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthSession, Registration, ResetDelivery};
use crate::services::AuthService;
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Response for `POST /auth/forgot-password`.
///
/// `code` is only present outside production when no mailer is configured.
#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.tokens())
}

/// Create an account and sign it in.
#[instrument(skip(state, form), fields(email = %form.email, role = %form.role))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let session = auth_service(&state)
        .register(&Registration {
            email: &form.email,
            password: &form.password,
            name: &form.name,
            phone: form.phone.as_deref(),
            address: form.address.as_deref(),
            role: form.role,
        })
        .await?;

    tracing::info!(user_id = %session.user.id, "Account registered");
    Ok(Json(session))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let session = auth_service(&state)
        .login(&form.email, &form.password)
        .await?;
    Ok(Json(session))
}

/// Current user profile.
#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> Result<Json<User>, AppError> {
    let profile = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_owned()))?;
    Ok(Json(profile))
}

/// Issue a password reset code.
///
/// The response is the same whether or not the email is registered.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    let expose_code = !state.config().environment.is_production();
    let delivery = auth_service(&state)
        .request_password_reset(&form.email, state.email(), expose_code)
        .await?;

    let code = match delivery {
        ResetDelivery::Returned(code) => Some(code),
        ResetDelivery::Emailed | ResetDelivery::Silent => None,
    };

    Ok(Json(ForgotPasswordResponse {
        message: "If the email is registered, a reset code has been sent",
        code,
    }))
}

#[instrument(skip(state, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service(&state)
        .reset_password(&form.email, &form.code, &form.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}
