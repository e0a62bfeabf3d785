//! Product image upload.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

fn multipart_error(err: &MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// Store an image and return its public URL.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        let url = state.uploads().save(&content_type, &bytes).await?;
        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}
