//! Category route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::db::categories::{CategoryRepository, NewCategory};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    #[serde(default)]
    pub icon: String,
}

/// All categories, ordered by English name.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

#[instrument(skip(state, admin, form), fields(slug = %form.slug))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(form): ApiJson<CreateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let slug = form.slug.trim().to_lowercase();
    let name_en = form.name_en.trim();
    let name_ar = form.name_ar.trim();
    if slug.is_empty() || name_en.is_empty() || name_ar.is_empty() {
        return Err(AppError::BadRequest(
            "Category names and slug are required".to_owned(),
        ));
    }

    let category = CategoryRepository::new(state.pool())
        .create(&NewCategory {
            name_ar,
            name_en,
            slug: &slug,
            icon: form.icon.trim(),
        })
        .await?;

    tracing::info!(category_id = %category.id, admin_id = %admin.id, "Category created");
    Ok(Json(category))
}
