//! Shopping cart route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::ProductId;

use super::{MessageResponse, not_found_as};
use crate::db::cart::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{CartView, CurrentUser};
use crate::state::AppState;

/// Largest quantity accepted in a single add.
const MAX_ADD_QUANTITY: i32 = 1000;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub message: &'static str,
    /// Line quantity after merging.
    pub quantity: i32,
}

/// Cart lines with current prices and the running total.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<CartView>, AppError> {
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;
    Ok(Json(CartView::from(lines)))
}

/// Add a product, merging with an existing line.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>, AppError> {
    if !(1..=MAX_ADD_QUANTITY).contains(&form.quantity) {
        return Err(AppError::BadRequest(format!(
            "Quantity must be between 1 and {MAX_ADD_QUANTITY}"
        )));
    }

    ProductRepository::new(state.pool())
        .get_active(form.product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let quantity = CartRepository::new(state.pool())
        .add(user.id, form.product_id, form.quantity)
        .await?;

    Ok(Json(AddToCartResponse {
        message: "Item added to cart",
        quantity,
    }))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>, AppError> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await
        .map_err(|e| not_found_as("Cart item", e))?;
    Ok(Json(MessageResponse::new("Item removed from cart")))
}

#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(MessageResponse::new("Cart cleared")))
}
