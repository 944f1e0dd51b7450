#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::StatusCode;
use jsonwebtoken::{EncodingKey, Header};
use rookgate::edge::{CookieConfig, RouteConfig};
use rookgate::session::User;
use rookgate::upstream::{AuthBackend, LoginRequest, SessionGrant, UpstreamError};
use rookgate::{ServerConfig, create_app_with_backend};
use serde::Serialize;
use url::Url;

pub const TEST_PASSWORD: &str = "correct-horse";
pub const TEST_IP: &str = "203.0.113.7";

/// Mint a signed test token with the given expiry. The gate never verifies
/// signatures, but real tokens are signed, so the fixtures are too.
pub fn token_with_exp(exp: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    jsonwebtoken::encode(
        &Header::default(),
        &Claims {
            sub: "u-1".to_string(),
            exp,
        },
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("failed to mint test token")
}

pub fn test_user() -> User {
    User {
        id: "u-1".into(),
        name: "Alice".into(),
        email: "alice@example.com".into(),
        roles: vec!["admin".into()],
        permissions: vec!["users.read".into(), "users.write".into()],
    }
}

/// Scriptable in-process auth backend.
pub struct MockBackend {
    pub fail_login: bool,
    pub fail_refresh: bool,
    pub expires_in: u64,
    pub refresh_calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            fail_login: false,
            fail_refresh: false,
            expires_in: 300,
            refresh_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_refresh() -> Self {
        Self {
            fail_refresh: true,
            ..Self::new()
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn grant(&self) -> SessionGrant {
        let now = rookgate::token::unix_now();
        SessionGrant {
            user: test_user(),
            access_token: token_with_exp(now + self.expires_in as i64),
            refresh_token: Some("rt-rotated".into()),
            expires_in: self.expires_in,
        }
    }
}

impl AuthBackend for MockBackend {
    async fn login(&self, request: &LoginRequest) -> Result<SessionGrant, UpstreamError> {
        if self.fail_login || request.password != TEST_PASSWORD {
            return Err(UpstreamError::Status(StatusCode::UNAUTHORIZED));
        }
        Ok(self.grant())
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<SessionGrant, UpstreamError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(UpstreamError::Status(StatusCode::UNAUTHORIZED));
        }
        Ok(self.grant())
    }

    async fn logout(&self, _access_token: Option<&str>) -> Result<(), UpstreamError> {
        Ok(())
    }
}

pub fn test_config() -> ServerConfig {
    test_config_with_upstream("http://127.0.0.1:9/api/")
}

pub fn test_config_with_upstream(upstream: &str) -> ServerConfig {
    ServerConfig {
        upstream: Url::parse(upstream).expect("invalid test upstream"),
        routes: RouteConfig::default(),
        cookies: CookieConfig::default(),
        secure_cookies: false,
    }
}

/// Build the app against a mock backend.
pub fn test_app(backend: MockBackend) -> axum::Router {
    create_app_with_backend(&test_config(), Arc::new(backend))
}

/// Extract Set-Cookie headers from response.
pub fn extract_set_cookies(response: &axum::http::Response<axum::body::Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Check if cookies contain a token being cleared (Max-Age=0).
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=", cookie_name)) && c.contains("Max-Age=0"))
}

/// Check if cookies set a non-empty value for the given name.
pub fn has_set_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies.iter().any(|c| {
        c.starts_with(&format!("{}=", cookie_name))
            && !c.starts_with(&format!("{}=;", cookie_name))
            && !c.contains("Max-Age=0")
    })
}

/// Read a JSON response body.
pub async fn body_json(response: axum::http::Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not JSON")
}
