//! Integration tests for authentication and role checks.
//!
//! Every rejection here happens in an extractor, before any query runs.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use souq_core::UserRole;
use souq_integration_tests::{TestApp, request};

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    for uri in [
        "/auth/me",
        "/cart",
        "/wishlist",
        "/orders/my",
        "/stores/my",
        "/reviews/my",
        "/complaints",
        "/api/cart",
    ] {
        let resp = app.get(uri, None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(resp.detail(), "Not authenticated");
    }
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new();

    let resp = app.get("/cart", Some("not.a.token")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.detail(), "Invalid or expired token");
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let app = TestApp::new();
    let mut config = souq_integration_tests::test_config();
    config.jwt_secret = "Zq4!nW8@rT2#kP6$vB1^mX5&cJ9*hL3%".to_owned().into();
    let other = TestApp::with_config(config, souq_integration_tests::unreachable_pool());

    let token = other.token_for(UserRole::Admin);
    let resp = app.get("/coupons", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Customer);

    let request = axum::http::Request::builder()
        .uri("/cart")
        .header("authorization", format!("Basic {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Role Tests
// ============================================================================

#[tokio::test]
async fn test_admin_only_routes_reject_other_roles() {
    let app = TestApp::new();

    for role in [UserRole::Customer, UserRole::StoreOwner] {
        let token = app.token_for(role);

        let resp = app.get("/coupons", Some(&token)).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(resp.detail(), "Admin access required");

        let resp = app.get("/orders", Some(&token)).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");

        let resp = app
            .post_json(
                "/categories",
                Some(&token),
                &json!({"name_ar": "كتب", "name_en": "Books", "slug": "books"}),
            )
            .await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");

        let store = souq_core::StoreId::new();
        let resp = app
            .send(request(
                Method::PATCH,
                &format!("/stores/{store}/approve?status=approved"),
                Some(&token),
                None,
            ))
            .await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");

        let resp = app
            .send(request(
                Method::DELETE,
                &format!("/stores/{store}"),
                Some(&token),
                None,
            ))
            .await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");

        let resp = app.get("/complaints/all", Some(&token)).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");

        let complaint = souq_core::ComplaintId::new();
        let resp = app
            .send(request(
                Method::PATCH,
                &format!("/complaints/{complaint}"),
                Some(&token),
                Some(&json!({"status": "resolved"})),
            ))
            .await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn test_seller_routes_reject_customers() {
    let app = TestApp::new();
    let token = app.token_for(UserRole::Customer);

    let resp = app
        .post_json("/stores", Some(&token), &json!({"store_name": "Corner"}))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.detail(), "Store owner access required");

    let resp = app
        .post_json(
            "/products",
            Some(&token),
            &json!({
                "category_id": souq_core::CategoryId::new(),
                "name": "Lamp",
                "price": "10.00",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app.get("/orders/store", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app
        .post_json("/upload-image", Some(&token), &json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_self_register() {
    let app = TestApp::new();

    let resp = app
        .post_json(
            "/auth/register",
            None,
            &json!({
                "email": "boss@example.com",
                "password": "long-enough",
                "name": "Boss",
                "role": "admin",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Rate Limit Tests
// ============================================================================

#[tokio::test]
async fn test_login_rate_limited_per_client() {
    let app = TestApp::new();
    let body = json!({"email": "not-an-email", "password": "whatever"});

    // Malformed emails fail without a query, so only the limiter varies.
    for _ in 0..5 {
        let resp = app.post_json("/auth/login", None, &body).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }
    let resp = app.post_json("/auth/login", None, &body).await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);

    // Another client still gets through.
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header("x-forwarded-for", "198.51.100.9")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_is_not_rate_limited() {
    let app = TestApp::new();

    for _ in 0..10 {
        let resp = app.get("/auth/me", None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }
}
