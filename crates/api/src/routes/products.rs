//! Product route handlers.
//!
//! Public listing and detail, plus seller-managed create, update and delete.
//! Store owners manage products in their own stores; admins manage any.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use souq_core::catalog::ProductSort;
use souq_core::{CategoryId, Price, ProductId, ProductStatus, StoreId, StoreStatus};

use super::{MessageResponse, not_found_as};
use crate::db::categories::CategoryRepository;
use crate::db::products::{NewProduct, ProductChanges, ProductFilter, ProductRepository};
use crate::db::stores::StoreRepository;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireSeller;
use crate::models::{CurrentUser, Product, ProductListing, Store};
use crate::state::AppState;

/// Suggestions returned by `/similar` when no limit is given.
const DEFAULT_SIMILAR_LIMIT: i64 = 8;

const NO_APPROVED_STORE: &str = "You need an approved store to add products";

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Defaults to the caller's first approved store.
    pub store_id: Option<StoreId>,
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub shoe_sizes: Vec<String>,
}

/// `PATCH` body. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub shoe_sizes: Option<Vec<String>>,
}

/// `PUT` body. Every editable field is replaced.
#[derive(Debug, Deserialize)]
pub struct ReplaceProductRequest {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock: i32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub shoe_sizes: Vec<String>,
}

impl From<ReplaceProductRequest> for UpdateProductRequest {
    fn from(form: ReplaceProductRequest) -> Self {
        Self {
            category_id: Some(form.category_id),
            name: Some(form.name),
            description: Some(form.description),
            price: Some(form.price),
            images: Some(form.images),
            stock: Some(form.stock),
            status: Some(form.status),
            sizes: Some(form.sizes),
            colors: Some(form.colors),
            shoe_sizes: Some(form.shoe_sizes),
        }
    }
}

/// Listing query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<CategoryId>,
    pub store_id: Option<StoreId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: ProductSort,
}

impl From<ProductListQuery> for ProductFilter {
    fn from(query: ProductListQuery) -> Self {
        Self {
            category_id: query.category_id,
            store_id: query.store_id,
            min_price: query.min_price,
            max_price: query.max_price,
            search: query
                .search
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            sort: query.sort_by,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<i64>,
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_owned()));
    }
    Ok(name.to_owned())
}

fn validate_stock(stock: i32) -> Result<i32, AppError> {
    if stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".to_owned()));
    }
    Ok(stock)
}

async fn ensure_category(state: &AppState, id: CategoryId) -> Result<(), AppError> {
    if CategoryRepository::new(state.pool()).exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest("Category not found".to_owned()))
    }
}

/// The store a new product goes into.
async fn target_store(
    state: &AppState,
    user: &CurrentUser,
    store_id: Option<StoreId>,
) -> Result<Store, AppError> {
    let stores = StoreRepository::new(state.pool());
    let store = match store_id {
        Some(id) => {
            let store = stores.get(id).await?.ok_or_else(|| AppError::not_found("Store"))?;
            if !store.is_managed_by(user) {
                return Err(AppError::Forbidden("Not authorized".to_owned()));
            }
            store
        }
        None => stores
            .first_approved_for_owner(user.id)
            .await?
            .ok_or_else(|| AppError::Forbidden(NO_APPROVED_STORE.to_owned()))?,
    };

    if store.status != StoreStatus::Approved {
        return Err(AppError::Forbidden(NO_APPROVED_STORE.to_owned()));
    }
    Ok(store)
}

/// Load a product and check the caller may change it.
async fn managed_product(
    state: &AppState,
    user: &CurrentUser,
    id: ProductId,
) -> Result<ProductListing, AppError> {
    let listing = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    if !user.is_admin() {
        let store = StoreRepository::new(state.pool())
            .get(listing.product.store_id)
            .await?;
        if !store.is_some_and(|s| s.is_managed_by(user)) {
            return Err(AppError::Forbidden("Not authorized".to_owned()));
        }
    }
    Ok(listing)
}

#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    ApiJson(form): ApiJson<CreateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let name = validate_name(&form.name)?;
    let stock = validate_stock(form.stock)?;
    let store = target_store(&state, &user, form.store_id).await?;
    ensure_category(&state, form.category_id).await?;

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            store_id: store.id,
            category_id: form.category_id,
            name,
            description: form.description.trim().to_owned(),
            price: form.price,
            images: form.images,
            stock,
            sizes: form.sizes,
            colors: form.colors,
            shoe_sizes: form.shoe_sizes,
        })
        .await?;

    tracing::info!(product_id = %product.id, store_id = %store.id, "Product created");
    Ok(Json(product))
}

/// Active products matching the filters, in the requested order.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Json<Vec<ProductListing>>, AppError> {
    if query
        .min_price
        .zip(query.max_price)
        .is_some_and(|(min, max)| min > max)
    {
        return Err(AppError::BadRequest(
            "min_price cannot exceed max_price".to_owned(),
        ));
    }

    let products = ProductRepository::new(state.pool())
        .list(&query.into())
        .await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductListing>, AppError> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Product"))
}

/// Active products from the same category, newest first.
#[instrument(skip(state))]
pub async fn similar(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<SimilarQuery>,
) -> Result<Json<Vec<ProductListing>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT);
    let products = ProductRepository::new(state.pool())
        .similar(id, limit)
        .await
        .map_err(|e| not_found_as("Product", e))?;
    Ok(Json(products))
}

/// Partial update.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(form): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    apply_changes(&state, &user, id, form).await.map(Json)
}

/// Full replacement of the editable fields.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn replace(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(form): ApiJson<ReplaceProductRequest>,
) -> Result<Json<Product>, AppError> {
    apply_changes(&state, &user, id, form.into()).await.map(Json)
}

async fn apply_changes(
    state: &AppState,
    user: &CurrentUser,
    id: ProductId,
    form: UpdateProductRequest,
) -> Result<Product, AppError> {
    managed_product(state, user, id).await?;

    if let Some(category_id) = form.category_id {
        ensure_category(state, category_id).await?;
    }
    let changes = ProductChanges {
        category_id: form.category_id,
        name: form.name.as_deref().map(validate_name).transpose()?,
        description: form.description.map(|d| d.trim().to_owned()),
        price: form.price,
        images: form.images,
        stock: form.stock.map(validate_stock).transpose()?,
        status: form.status,
        sizes: form.sizes,
        colors: form.colors,
        shoe_sizes: form.shoe_sizes,
    };

    let product = ProductRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| not_found_as("Product", e))?;

    tracing::info!(product_id = %id, "Product updated");
    Ok(product)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>, AppError> {
    managed_product(&state, &user, id).await?;

    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| not_found_as("Product", e))?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;

    use super::*;

    fn list_query(uri: &str) -> ProductListQuery {
        let uri: Uri = uri.parse().unwrap();
        Query::<ProductListQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_list_query_blank_search_is_ignored() {
        let filter = ProductFilter::from(list_query("/products?search=%20%20&sort_by=price_low"));
        assert_eq!(filter.search, None);
        assert_eq!(filter.sort, ProductSort::PriceLow);
    }

    #[test]
    fn test_list_query_defaults_to_newest() {
        let query = list_query("/products?min_price=10.5");
        assert_eq!(query.sort_by, ProductSort::Newest);
        assert_eq!(query.min_price, Some(Decimal::new(105, 1)));
    }

    #[test]
    fn test_replace_sets_every_field() {
        let form: ReplaceProductRequest = serde_json::from_value(serde_json::json!({
            "category_id": CategoryId::new(),
            "name": "Shirt",
            "price": "19.99",
            "stock": 3,
        }))
        .unwrap();
        let changes = UpdateProductRequest::from(form);
        assert_eq!(changes.status, Some(ProductStatus::Active));
        assert_eq!(changes.images, Some(Vec::new()));
        assert_eq!(changes.stock, Some(3));
    }

    #[test]
    fn test_validation() {
        assert!(validate_name("  ").is_err());
        assert_eq!(validate_name(" Mug ").unwrap(), "Mug");
        assert!(validate_stock(-1).is_err());
        assert_eq!(validate_stock(0).unwrap(), 0);
    }
}
