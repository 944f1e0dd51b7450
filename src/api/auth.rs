//! Session endpoints.
//!
//! - POST `/login` - exchange credentials for a cookie-backed session
//! - POST `/refresh` - rotate the access token from the refresh cookie
//! - POST `/logout` - best-effort upstream revoke, clear all cookies
//! - GET `/session` - current expiry verdict for the polling status client

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::error::{ApiError, ResultExt};
use crate::edge::{
    CookieConfig, clear_cookie, get_cookie, set_access_cookie, set_expiry_cookie,
    set_refresh_cookie,
};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_refresh};
use crate::session::User;
use crate::token::{TokenExpiryFact, unix_now};
use crate::upstream::{AuthBackend, LoginRequest, SessionGrant};

/// Lifetime of the refresh-token cookie. The backend is authoritative for
/// the token's actual validity; this only bounds how long the browser
/// keeps resending it.
const REFRESH_COOKIE_MAX_AGE_SECS: u64 = 14 * 24 * 60 * 60;

pub struct AuthApiState<B> {
    pub backend: Arc<B>,
    pub cookies: CookieConfig,
    pub secure_cookies: bool,
}

impl<B> Clone for AuthApiState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cookies: self.cookies.clone(),
            secure_cookies: self.secure_cookies,
        }
    }
}

pub fn router<B: AuthBackend>(
    state: AuthApiState<B>,
    rate_limits: Arc<RateLimitConfig>,
) -> Router {
    let limited = Router::new()
        .route(
            "/login",
            post(login::<B>).route_layer(middleware::from_fn_with_state(
                rate_limits.clone(),
                rate_limit_login,
            )),
        )
        .route(
            "/refresh",
            post(refresh::<B>).route_layer(middleware::from_fn_with_state(
                rate_limits,
                rate_limit_refresh,
            )),
        );

    limited
        .route("/logout", post(logout::<B>))
        .route("/session", get(session_status::<B>))
        .with_state(state)
}

/// Body of a successful login/refresh: the wire shape the client stores
/// wholesale (tokens travel only in cookies).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    user: User,
    expires_in: u64,
}

/// Cookies for a fresh grant: access + expiry always, refresh only when
/// the backend rotated it.
fn grant_cookies<B>(
    state: &AuthApiState<B>,
    grant: &SessionGrant,
) -> Vec<(axum::http::HeaderName, String)> {
    let expires_at = OffsetDateTime::now_utc() + time::Duration::seconds(grant.expires_in as i64);
    let mut cookies = vec![
        (
            SET_COOKIE,
            set_access_cookie(
                &state.cookies.access,
                &grant.access_token,
                grant.expires_in,
                state.secure_cookies,
            ),
        ),
        (
            SET_COOKIE,
            set_expiry_cookie(
                &state.cookies.expires_at,
                expires_at,
                grant.expires_in,
                state.secure_cookies,
            ),
        ),
    ];
    if let Some(refresh_token) = &grant.refresh_token {
        cookies.push((
            SET_COOKIE,
            set_refresh_cookie(
                &state.cookies.refresh,
                refresh_token,
                REFRESH_COOKIE_MAX_AGE_SECS,
                state.secure_cookies,
            ),
        ));
    }
    cookies
}

async fn login<B: AuthBackend>(
    State(state): State<AuthApiState<B>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let grant = state
        .backend
        .login(&request)
        .await
        .upstream_err("Invalid credentials")?;

    info!(user = %grant.user.id, "login succeeded");

    Ok((
        StatusCode::OK,
        AppendHeaders(grant_cookies(&state, &grant)),
        Json(SessionResponse {
            expires_in: grant.expires_in,
            user: grant.user,
        }),
    ))
}

/// Refresh the access token using the refresh cookie.
///
/// Safe to call redundantly: each call returns a fresh grant, and
/// concurrent client-side callers are expected to gate themselves.
async fn refresh<B: AuthBackend>(
    State(state): State<AuthApiState<B>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = get_cookie(&headers, &state.cookies.refresh)
        .ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let grant = state
        .backend
        .refresh(refresh_token)
        .await
        .upstream_err("Invalid or expired refresh token")?;

    Ok((
        StatusCode::OK,
        AppendHeaders(grant_cookies(&state, &grant)),
        Json(SessionResponse {
            expires_in: grant.expires_in,
            user: grant.user,
        }),
    ))
}

/// Logout: revoke upstream (best effort) and clear all three cookies.
async fn logout<B: AuthBackend>(
    State(state): State<AuthApiState<B>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let access_token = get_cookie(&headers, &state.cookies.access);
    if let Err(e) = state.backend.logout(access_token).await {
        warn!(error = %e, "upstream logout failed");
    }

    let clears = [
        (SET_COOKIE, clear_cookie(&state.cookies.access, state.secure_cookies)),
        (SET_COOKIE, clear_cookie(&state.cookies.refresh, state.secure_cookies)),
        (
            SET_COOKIE,
            clear_cookie(&state.cookies.expires_at, state.secure_cookies),
        ),
    ];

    (
        StatusCode::OK,
        AppendHeaders(clears),
        Json(serde_json::json!({ "success": true })),
    )
}

/// Current expiry verdict, recomputed from the access cookie on every call.
/// Missing or malformed tokens yield the fail-closed verdict, not an error.
async fn session_status<B: AuthBackend>(
    State(state): State<AuthApiState<B>>,
    headers: HeaderMap,
) -> Json<TokenExpiryFact> {
    let fact = match get_cookie(&headers, &state.cookies.access) {
        Some(token) => TokenExpiryFact::from_token(token, unix_now()),
        None => TokenExpiryFact::expired(),
    };
    Json(fact)
}
