//! HTTP route handlers for the marketplace API.
//!
//! Every route below is served both at the root and under `/api`.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                          - Service banner
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check (database)
//!
//! # Auth (rate limited)
//! POST   /auth/register             - Create a customer or store owner account
//! POST   /auth/login                - Exchange credentials for a token
//! GET    /auth/me                   - Current user
//! POST   /auth/forgot-password      - Issue a reset code
//! POST   /auth/reset-password       - Consume a reset code
//!
//! # Stores
//! POST   /stores                    - Open a store (seller)
//! GET    /stores                    - List stores, optionally by ?status=
//! GET    /stores/my                 - Caller's stores
//! GET    /stores/{id}               - Store detail
//! PATCH  /stores/{id}/approve       - Set ?status= (admin)
//! DELETE /stores/{id}               - Delete store and its products (admin)
//!
//! # Catalog
//! GET    /categories                - All categories
//! POST   /categories                - Create category (admin)
//! POST   /products                  - Create product (seller)
//! GET    /products                  - Filtered, sorted listing
//! GET    /products/{id}             - Product detail
//! GET    /products/{id}/similar     - Same-category suggestions
//! PATCH  /products/{id}             - Partial update (owner or admin)
//! PUT    /products/{id}             - Full update (owner or admin)
//! DELETE /products/{id}             - Delete (owner or admin)
//! POST   /upload-image              - Multipart image upload (seller)
//!
//! # Shopping
//! GET    /cart                      - Cart with line totals
//! POST   /cart/add                  - Add or merge a line
//! DELETE /cart/{product_id}         - Remove a line
//! DELETE /cart                      - Empty the cart
//! POST   /orders                    - Check out the cart
//! GET    /orders/my                 - Caller's orders
//! GET    /orders                    - All orders (admin)
//! GET    /orders/store              - Orders touching the caller's stores
//! GET    /orders/{id}               - Order detail
//! PATCH  /orders/{id}/status        - Set ?status=
//! GET    /wishlist                  - Wishlisted products
//! POST   /wishlist/add/{id}         - Add to wishlist
//! DELETE /wishlist/remove/{id}      - Remove from wishlist
//!
//! # Reviews
//! GET    /products/{id}/reviews     - Reviews for a product
//! POST   /products/{id}/reviews     - Review a product
//! POST   /reviews                   - Review a product (id in body)
//! GET    /reviews/my                - Caller's reviews
//!
//! # Coupons
//! POST   /coupons                   - Create coupon (admin)
//! GET    /coupons                   - All coupons (admin)
//! POST   /coupons/validate          - Price a total with a coupon
//! DELETE /coupons/{id}              - Deactivate coupon (admin)
//!
//! # Complaints
//! POST   /complaints                - File a complaint
//! GET    /complaints                - Caller's complaints
//! GET    /complaints/all            - All complaints, optionally by ?status= (admin)
//! PATCH  /complaints/{id}           - Set status and/or response (admin)
//!
//! # Payments
//! POST   /payments/checkout         - Open a hosted checkout for a package
//! GET    /payments/status/{session} - Poll and record session status
//! POST   /webhook/stripe            - Signed provider events
//! ```
//!
//! Uploaded images are served from `/uploads`.

pub mod auth;
pub mod cart;
pub mod categories;
pub mod complaints;
pub mod coupons;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod stores;
pub mod uploads;
pub mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request},
    middleware,
    routing::{delete, get, patch, post},
};
use serde::Serialize;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::{ApiConfig, CorsOrigins};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{
    auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::services::uploads::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Room for multipart framing around the largest accepted image.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

/// `{"message": ...}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Name the missing entity when a repository reports `NotFound`.
pub(crate) fn not_found_as(what: &str, err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::not_found(what),
        other => other.into(),
    }
}

/// Create the auth routes router.
///
/// Credential endpoints share one per-IP rate limiter; `/me` is not limited.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter());

    Router::new().route("/me", get(auth::me)).merge(limited)
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index).post(stores::create))
        .route("/my", get(stores::mine))
        .route("/{id}", get(stores::show).delete(stores::destroy))
        .route("/{id}/approve", patch(stores::approve))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new().route("/", get(categories::index).post(categories::create))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .put(products::replace)
                .delete(products::destroy),
        )
        .route("/{id}/similar", get(products::similar))
        .route(
            "/{id}/reviews",
            get(reviews::for_product).post(reviews::create_for_product),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/add", post(cart::add))
        .route("/{product_id}", delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/my", get(orders::mine))
        .route("/store", get(orders::for_my_stores))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add/{product_id}", post(wishlist::add))
        .route("/remove/{product_id}", delete(wishlist::remove))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(reviews::create))
        .route("/my", get(reviews::mine))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index).post(coupons::create))
        .route("/validate", post(coupons::validate))
        .route("/{id}", delete(coupons::deactivate))
}

/// Create the complaint routes router.
pub fn complaint_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(complaints::mine).post(complaints::create))
        .route("/all", get(complaints::index))
        .route("/{id}", patch(complaints::respond))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(payments::checkout))
        .route("/status/{session_id}", get(payments::status))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/stores", store_routes())
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .route(
            "/upload-image",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/reviews", review_routes())
        .nest("/coupons", coupon_routes())
        .nest("/complaints", complaint_routes())
        .nest("/payments", payment_routes())
        .route("/webhook/stripe", post(payments::stripe_webhook))
}

/// Build the complete application: routes at the root and under `/api`,
/// the uploads directory, and the middleware stack.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let api = routes();
    let cors = cors_layer(state.config());
    let uploads = ServeDir::new(&state.config().upload_dir);

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Span for one request. `request_id` and `user_id` are filled in later by
/// the request ID middleware and the auth extractor.
fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    )
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    match &config.cors_origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::List(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
    }
}
