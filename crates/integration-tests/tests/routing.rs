//! Integration tests for the service banner, health checks and the
//! middleware stack.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use souq_integration_tests::TestApp;

// ============================================================================
// Banner & Prefix Tests
// ============================================================================

#[tokio::test]
async fn test_banner_at_root_and_under_api() {
    let app = TestApp::new();

    for uri in ["/", "/api"] {
        let resp = app.get(uri, None).await;
        assert_eq!(resp.status, StatusCode::OK, "{uri}");
        assert_eq!(resp.json()["message"], "Marketplace API is running");
    }
}

#[tokio::test]
async fn test_liveness_does_not_touch_database() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text(), "ok");

    let resp = app.get("/api/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new();

    let resp = app.get("/health/ready", None).await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new();

    let resp = app.get("/no-such-thing", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;
    assert_eq!(resp.headers["x-frame-options"], "DENY");
    assert_eq!(resp.headers["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers["referrer-policy"], "no-referrer");
}

#[tokio::test]
async fn test_request_id_generated() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;
    let id = resp.headers["x-request-id"].to_str().unwrap();
    assert!(uuid_like(id), "unexpected request id {id}");
}

#[tokio::test]
async fn test_request_id_echoed_from_upstream() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "upstream-42")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.headers["x-request-id"], "upstream-42");
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .uri("/health")
        .header("origin", "https://shop.example.com")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.send(request).await;
    assert_eq!(resp.headers["access-control-allow-origin"], "*");
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
}
