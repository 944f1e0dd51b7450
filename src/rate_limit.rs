//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to prevent brute force
//! and refresh-hammering.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

/// Per-IP rate limiter for endpoint-specific limiting.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for the session endpoints.
pub struct RateLimitConfig {
    /// Per-IP limiter for login (generous: 10 requests per second).
    pub login: Arc<IpLimiter>,
    /// Per-IP limiter for refresh (1 per second, burst of 5 - a
    /// well-behaved client is gated to far less than this).
    pub refresh: Arc<IpLimiter>,
}

impl RateLimitConfig {
    pub fn new() -> Self {
        const LOGIN_PER_SEC: u32 = 10;
        const REFRESH_PER_SEC: u32 = 1;
        const REFRESH_BURST: u32 = 5;

        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_second(
                NonZeroU32::new(LOGIN_PER_SEC).unwrap(),
            ))),
            refresh: Arc::new(RateLimiter::keyed(
                Quota::per_second(NonZeroU32::new(REFRESH_PER_SEC).unwrap())
                    .allow_burst(NonZeroU32::new(REFRESH_BURST).unwrap()),
            )),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the client IP from proxy headers, falling back to the socket.
pub fn extract_client_ip(request: &Request) -> Option<String> {
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;

    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first_ip) = value.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
}

/// Middleware for rate limiting the login endpoint.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ip) = extract_client_ip(&request) else {
        return (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response();
    };

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}

/// Middleware for rate limiting the refresh endpoint.
pub async fn rate_limit_refresh(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ip) = extract_client_ip(&request) else {
        return (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response();
    };

    match config.refresh.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many refresh attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}
