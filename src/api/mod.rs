mod auth;
mod error;
mod proxy;

use std::sync::Arc;

use axum::Router;
use url::Url;

use crate::edge::CookieConfig;
use crate::rate_limit::RateLimitConfig;
use crate::upstream::AuthBackend;

pub use auth::AuthApiState;

/// Create the API router: session endpoints plus the resource passthrough.
pub fn create_api_router<B: AuthBackend>(
    backend: Arc<B>,
    upstream: Url,
    cookies: CookieConfig,
    secure_cookies: bool,
) -> Router {
    let auth_state = auth::AuthApiState {
        backend,
        cookies: cookies.clone(),
        secure_cookies,
    };

    let proxy_state = proxy::ProxyState {
        http: reqwest::Client::new(),
        upstream,
        cookies,
    };

    let rate_limits = Arc::new(RateLimitConfig::new());

    Router::new()
        .nest("/auth", auth::router(auth_state, rate_limits))
        .nest("/v1", proxy::router(proxy_state))
}
