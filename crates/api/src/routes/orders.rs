//! Order route handlers.
//!
//! Customers see their own orders, store owners see orders containing their
//! products, admins see everything.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::pricing::normalize_coupon_code;
use souq_core::{OrderId, OrderStatus, PaymentMethod, StoreId};

use super::not_found_as;
use crate::db::orders::{OrderRepository, PlaceOrder};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireSeller};
use crate::models::{CurrentUser, Order};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusQuery {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    pub message: &'static str,
    pub status: OrderStatus,
}

/// Check out the caller's cart.
#[instrument(skip(state, form), fields(payment_method = %form.payment_method))]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let shipping_address = form.shipping_address.trim();
    let phone = form.phone.trim();
    if shipping_address.is_empty() || phone.is_empty() {
        return Err(AppError::BadRequest(
            "Shipping address and phone are required".to_owned(),
        ));
    }

    let coupon_code = form
        .coupon_code
        .as_deref()
        .map(normalize_coupon_code)
        .filter(|code| !code.is_empty());

    let order = OrderRepository::new(state.pool())
        .place(&PlaceOrder {
            customer_id: user.id,
            shipping_address,
            phone,
            payment_method: form.payment_method,
            coupon_code: coupon_code.as_deref(),
        })
        .await?;

    tracing::info!(
        order_id = %order.id,
        total = %order.total_amount,
        coupon = order.coupon_code.as_deref().unwrap_or(""),
        "Order placed"
    );
    Ok(Json(order))
}

#[instrument(skip(state))]
pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_by_customer(user.id)
        .await?;
    Ok(Json(orders))
}

/// Every order.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// Orders with at least one line from the caller's stores.
#[instrument(skip(state))]
pub async fn for_my_stores(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_store_owner(user.id)
        .await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>, AppError> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(|| AppError::not_found("Order"))?;

    let allowed = order.customer_id == user.id
        || user.is_admin()
        || supplies_order(&repo, &user, &order).await?;
    if !allowed {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }
    Ok(Json(order))
}

/// Move an order to any status. Allowed for admins and owners of a store
/// that supplied the order.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<OrderId>,
    ApiQuery(query): ApiQuery<OrderStatusQuery>,
) -> Result<Json<OrderStatusResponse>, AppError> {
    let repo = OrderRepository::new(state.pool());
    let order = repo.get(id).await?.ok_or_else(|| AppError::not_found("Order"))?;

    if !user.is_admin() && !supplies_order(&repo, &user, &order).await? {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }

    repo.set_status(id, query.status)
        .await
        .map_err(|e| not_found_as("Order", e))?;

    tracing::info!(
        order_id = %id,
        from = %order.status,
        to = %query.status,
        "Order status updated"
    );
    Ok(Json(OrderStatusResponse {
        message: "Order status updated",
        status: query.status,
    }))
}

/// Whether the caller owns a store with a line in `order`.
async fn supplies_order(
    repo: &OrderRepository<'_>,
    user: &CurrentUser,
    order: &Order,
) -> Result<bool, AppError> {
    if !user.role.can_sell() {
        return Ok(false);
    }
    let store_ids: Vec<StoreId> = order.store_ids().collect();
    Ok(repo.owns_any_store(user.id, &store_ids).await?)
}
