//! Complaint route handlers.
//!
//! Any signed-in user may file a complaint, optionally about one of their own
//! orders, and follow its status. Admins see every complaint and answer them.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use souq_core::{ComplaintId, ComplaintStatus, OrderId};

use super::not_found_as;
use crate::db::complaints::{ComplaintRepository, NewComplaint};
use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::{Complaint, CurrentUser};
use crate::state::AppState;

const MAX_SUBJECT_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_IMAGES: usize = 5;

#[derive(Debug, Deserialize)]
pub struct CreateComplaintRequest {
    pub subject: String,
    pub message: String,
    pub order_id: Option<OrderId>,
    /// URLs returned by `/upload-image`.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComplaintListQuery {
    pub status: Option<ComplaintStatus>,
}

/// Admin update. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: Option<ComplaintStatus>,
    pub admin_response: Option<String>,
}

fn required_text(value: &str, field: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(value.to_owned())
}

fn validate_images(images: Vec<String>) -> Result<Vec<String>, AppError> {
    if images.len() > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_IMAGES} images are allowed"
        )));
    }
    let images: Vec<String> = images.into_iter().map(|url| url.trim().to_owned()).collect();
    if images.iter().any(String::is_empty) {
        return Err(AppError::BadRequest("Image URL cannot be empty".to_owned()));
    }
    Ok(images)
}

/// File a complaint.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<CreateComplaintRequest>,
) -> Result<Json<Complaint>, AppError> {
    let subject = required_text(&form.subject, "Subject", MAX_SUBJECT_CHARS)?;
    let message = required_text(&form.message, "Message", MAX_MESSAGE_CHARS)?;
    let images = validate_images(form.images)?;

    // Only the customer's own orders can be referenced.
    if let Some(order_id) = form.order_id {
        let order = OrderRepository::new(state.pool()).get(order_id).await?;
        if !order.is_some_and(|o| o.customer_id == user.id) {
            return Err(AppError::not_found("Order"));
        }
    }

    let complaint = ComplaintRepository::new(state.pool())
        .create(&NewComplaint {
            user_id: user.id,
            order_id: form.order_id,
            subject: &subject,
            message: &message,
            images: &images,
        })
        .await?;

    tracing::info!(complaint_id = %complaint.id, "Complaint filed");
    Ok(Json(complaint))
}

/// The caller's complaints.
#[instrument(skip(state))]
pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Complaint>>, AppError> {
    let complaints = ComplaintRepository::new(state.pool())
        .by_user(user.id)
        .await?;
    Ok(Json(complaints))
}

#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ComplaintListQuery>,
) -> Result<Json<Vec<Complaint>>, AppError> {
    let complaints = ComplaintRepository::new(state.pool())
        .list(query.status)
        .await?;
    Ok(Json(complaints))
}

/// Set a complaint's status and/or the admin response.
#[instrument(skip(state, admin, form), fields(admin_id = %admin.id))]
pub async fn respond(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ComplaintId>,
    ApiJson(form): ApiJson<RespondRequest>,
) -> Result<Json<Complaint>, AppError> {
    let admin_response = form
        .admin_response
        .as_deref()
        .map(|text| required_text(text, "Response", MAX_MESSAGE_CHARS))
        .transpose()?;
    if form.status.is_none() && admin_response.is_none() {
        return Err(AppError::BadRequest("Provide a status or a response".to_owned()));
    }

    let complaint = ComplaintRepository::new(state.pool())
        .respond(id, form.status, admin_response.as_deref())
        .await
        .map_err(|e| not_found_as("Complaint", e))?;

    tracing::info!(
        complaint_id = %id,
        status = %complaint.status,
        "Complaint updated"
    );
    Ok(Json(complaint))
}
