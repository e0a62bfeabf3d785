//! Review route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use souq_core::{ProductId, Rating};

use crate::db::products::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, capitalize};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{CurrentUser, Review};
use crate::state::AppState;

/// Longest accepted review comment, in characters.
const MAX_COMMENT_CHARS: usize = 2000;

/// Review body for `POST /products/{id}/reviews`.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

/// Review body for `POST /reviews`.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: ProductId,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

#[instrument(skip(state))]
pub async fn for_product(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = ReviewRepository::new(state.pool())
        .for_product(product_id)
        .await?;
    Ok(Json(reviews))
}

#[instrument(skip(state, form))]
pub async fn create_for_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(form): ApiJson<ReviewRequest>,
) -> Result<Json<Review>, AppError> {
    write_review(&state, &user, product_id, form.rating, &form.comment)
        .await
        .map(Json)
}

#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<CreateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    write_review(&state, &user, form.product_id, form.rating, &form.comment)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = ReviewRepository::new(state.pool()).by_user(user.id).await?;
    Ok(Json(reviews))
}

/// One review per user and product.
async fn write_review(
    state: &AppState,
    user: &CurrentUser,
    product_id: ProductId,
    rating: i64,
    comment: &str,
) -> Result<Review, AppError> {
    let rating = Rating::new(rating).map_err(|e| AppError::BadRequest(capitalize(&e.to_string())))?;
    let comment = comment.trim();
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Comment cannot exceed {MAX_COMMENT_CHARS} characters"
        )));
    }

    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let review = ReviewRepository::new(state.pool())
        .create(product_id, user.id, rating, comment)
        .await?;

    tracing::info!(review_id = %review.id, product_id = %product_id, "Review created");
    Ok(review)
}
