//! Wishlist route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use souq_core::ProductId;

use super::MessageResponse;
use crate::db::products::ProductRepository;
use crate::db::wishlist::WishlistRepository;
use crate::error::AppError;
use crate::extract::ApiPath;
use crate::models::{CurrentUser, Product};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub products: Vec<Product>,
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<WishlistResponse>, AppError> {
    let products = WishlistRepository::new(state.pool())
        .products(user.id)
        .await?;
    Ok(Json(WishlistResponse { products }))
}

/// Add a product. Adding one that is already wishlisted is a no-op.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>, AppError> {
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    WishlistRepository::new(state.pool())
        .add(user.id, product_id)
        .await?;
    Ok(Json(MessageResponse::new("Added to wishlist")))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    if !removed {
        tracing::debug!(product_id = %product_id, "Product was not wishlisted");
    }
    Ok(Json(MessageResponse::new("Removed from wishlist")))
}
