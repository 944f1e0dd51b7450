//! Tests for the edge access gate.
//!
//! Tests cover:
//! - Protected routes: redirect with return path, cookie invalidation,
//!   expired-but-refreshable passthrough
//! - Auth-only routes: redirecting authenticated users away
//! - API routes: refresh-signal tagging (recommended vs required)
//! - Fail-closed handling of malformed tokens

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header::LOCATION},
};
use common::{
    MockBackend, extract_set_cookies, has_cleared_cookie, test_app, token_with_exp,
};
use rookgate::edge::REFRESH_SIGNAL_HEADER;
use rookgate::token::unix_now;
use tower::ServiceExt;

fn get(path: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookies) = cookies {
        builder = builder.header("cookie", cookies);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &axum::http::Response<Body>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
}

// =============================================================================
// Protected routes
// =============================================================================

#[tokio::test]
async fn test_protected_route_without_token_redirects_with_return_path() {
    let app = test_app(MockBackend::new());

    let response = app.oneshot(get("/dashboard/users", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/auth/login?redirect=/dashboard/users"
    );
}

#[tokio::test]
async fn test_protected_route_expired_token_no_refresh_clears_access_state() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() - 10);

    let response = app
        .oneshot(get("/dashboard", Some(&format!("auth_token={}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&response).starts_with("/auth/login"));

    let cookies = extract_set_cookies(&response);
    assert!(has_cleared_cookie(&cookies, "auth_token"));
    assert!(has_cleared_cookie(&cookies, "token_expires_at"));
    // The refresh cookie's lifecycle is never the edge gate's to end.
    assert!(!has_cleared_cookie(&cookies, "refresh_token"));
}

#[tokio::test]
async fn test_protected_route_expired_token_with_refresh_passes_through() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() - 10);

    let response = app
        .oneshot(get(
            "/dashboard",
            Some(&format!("auth_token={}; refresh_token=rt-1", token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_live_token_passes_through() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() + 3_600);

    let response = app
        .oneshot(get(
            "/dashboard/roles",
            Some(&format!("auth_token={}", token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_malformed_token_fails_closed() {
    let app = test_app(MockBackend::new());

    let response = app
        .oneshot(get("/dashboard", Some("auth_token=not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let cookies = extract_set_cookies(&response);
    assert!(has_cleared_cookie(&cookies, "auth_token"));
}

// =============================================================================
// Auth-only routes
// =============================================================================

#[tokio::test]
async fn test_login_page_with_live_token_redirects_away() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() + 3_600);

    let response = app
        .oneshot(get("/auth/login", Some(&format!("auth_token={}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_login_page_with_expired_token_is_served() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() - 10);

    let response = app
        .oneshot(get("/auth/login", Some(&format!("auth_token={}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_page_without_token_is_served() {
    let app = test_app(MockBackend::new());

    let response = app.oneshot(get("/auth/login", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// API routes: refresh-signal tagging
// =============================================================================

#[tokio::test]
async fn test_api_route_inside_refresh_window_tagged_recommended() {
    let app = test_app(MockBackend::new());
    // 120s left, threshold is 300s.
    let token = token_with_exp(unix_now() + 120);

    let response = app
        .oneshot(get(
            "/api/auth/session",
            Some(&format!("auth_token={}", token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(REFRESH_SIGNAL_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("recommended")
    );
}

#[tokio::test]
async fn test_api_route_expired_with_refresh_tagged_required() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() - 10);

    let response = app
        .oneshot(get(
            "/api/auth/session",
            Some(&format!("auth_token={}; refresh_token=rt-1", token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(REFRESH_SIGNAL_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("required")
    );
}

#[tokio::test]
async fn test_api_route_fresh_token_untagged() {
    let app = test_app(MockBackend::new());
    let token = token_with_exp(unix_now() + 3_600);

    let response = app
        .oneshot(get(
            "/api/auth/session",
            Some(&format!("auth_token={}", token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(REFRESH_SIGNAL_HEADER).is_none());
}

#[tokio::test]
async fn test_api_route_without_token_not_redirected() {
    let app = test_app(MockBackend::new());

    // Absence of an access token on API routes is the handler's decision;
    // the session endpoint answers with the fail-closed verdict.
    let response = app.oneshot(get("/api/auth/session", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(REFRESH_SIGNAL_HEADER).is_none());
}

/// Spec scenario against a real resource route: a live-but-closing token on
/// `/api/v1/users` gets the request proxied upstream (bearer attached) and
/// the response tagged "recommended".
#[tokio::test]
async fn test_api_resource_route_proxied_and_tagged() {
    use axum::http::header::AUTHORIZATION;

    // Tiny upstream answering the proxied resource call with whatever
    // bearer it received.
    let upstream_app = axum::Router::new().route(
        "/api/v1/users",
        axum::routing::get(|headers: axum::http::HeaderMap| async move {
            let bearer = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            axum::Json(serde_json::json!({ "data": [], "bearer": bearer }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream_app).await.ok();
    });

    let config =
        common::test_config_with_upstream(&format!("http://127.0.0.1:{}/api/", addr.port()));
    let app = rookgate::create_app_with_backend(&config, std::sync::Arc::new(MockBackend::new()));

    let token = token_with_exp(unix_now() + 120);
    let response = app
        .oneshot(get(
            "/api/v1/users",
            Some(&format!("auth_token={}", token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(REFRESH_SIGNAL_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("recommended")
    );

    let body = common::body_json(response).await;
    assert_eq!(
        body.get("bearer").and_then(|v| v.as_str()),
        Some(format!("Bearer {}", token).as_str())
    );
}

// =============================================================================
// Everything else
// =============================================================================

#[tokio::test]
async fn test_unclassified_route_passes_through() {
    let app = test_app(MockBackend::new());

    let response = app.oneshot(get("/health", None)).await.unwrap();

    // No redirect: the gate lets it through to the (404) fallback.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
