//! Store route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::{StoreId, StoreStatus};

use crate::db::stores::{NewStore, StoreRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireSeller};
use crate::models::{CurrentUser, Store};
use crate::state::AppState;

use super::not_found_as;

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub store_name: String,
    #[serde(default)]
    pub description: String,
    pub phone: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreListQuery {
    pub status: Option<StoreStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveQuery {
    pub status: StoreStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: &'static str,
    pub status: StoreStatus,
}

#[derive(Debug, Serialize)]
pub struct DeleteStoreResponse {
    pub message: &'static str,
    pub store_id: StoreId,
    pub products_deleted: u64,
}

/// Open a store. New stores wait for admin approval.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    ApiJson(form): ApiJson<CreateStoreRequest>,
) -> Result<Json<Store>, AppError> {
    let store_name = form.store_name.trim();
    if store_name.is_empty() {
        return Err(AppError::BadRequest("Store name is required".to_owned()));
    }

    let store = StoreRepository::new(state.pool())
        .create(&NewStore {
            owner_id: user.id,
            store_name,
            description: form.description.trim(),
            phone: form.phone.as_deref(),
            logo: form.logo.as_deref(),
        })
        .await?;

    tracing::info!(store_id = %store.id, "Store created, pending approval");
    Ok(Json(store))
}

/// List stores, optionally filtered by status.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StoreListQuery>,
) -> Result<Json<Vec<Store>>, AppError> {
    let stores = StoreRepository::new(state.pool()).list(query.status).await?;
    Ok(Json(stores))
}

#[instrument(skip(state))]
pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Store>>, AppError> {
    let stores = StoreRepository::new(state.pool())
        .list_by_owner(user.id)
        .await?;
    Ok(Json(stores))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StoreId>,
) -> Result<Json<Store>, AppError> {
    StoreRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Store"))
}

/// Approve, reject or reset a store to pending.
#[instrument(skip(state, admin))]
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<StoreId>,
    ApiQuery(query): ApiQuery<ApproveQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    StoreRepository::new(state.pool())
        .set_status(id, query.status)
        .await
        .map_err(|e| not_found_as("Store", e))?;

    tracing::info!(
        store_id = %id,
        admin_id = %admin.id,
        status = %query.status,
        "Store status updated"
    );
    Ok(Json(StatusResponse {
        message: "Store status updated",
        status: query.status,
    }))
}

/// Delete a store together with all of its products.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<StoreId>,
) -> Result<Json<DeleteStoreResponse>, AppError> {
    let products_deleted = StoreRepository::new(state.pool())
        .delete_with_products(id)
        .await
        .map_err(|e| not_found_as("Store", e))?;

    tracing::info!(
        store_id = %id,
        admin_id = %admin.id,
        products_deleted,
        "Store deleted"
    );
    Ok(Json(DeleteStoreResponse {
        message: "Store deleted",
        store_id: id,
        products_deleted,
    }))
}
