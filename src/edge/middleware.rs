//! Axum middleware applying the edge gate to every request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::cookie::{CookieConfig, clear_cookie, get_cookie};
use super::gate::{GateDecision, REFRESH_SIGNAL_HEADER, evaluate};
use super::routes::RouteConfig;
use crate::token::unix_now;

/// Shared state for the gate middleware.
#[derive(Clone)]
pub struct EdgeState {
    pub routes: RouteConfig,
    pub cookies: CookieConfig,
    pub secure_cookies: bool,
}

/// Evaluate the gate ahead of the matched handler.
///
/// Synchronous string/JSON work only; the single suspension point is the
/// downstream handler itself.
pub async fn edge_access_gate(
    State(state): State<Arc<EdgeState>>,
    request: Request,
    next: Next,
) -> Response {
    let access = get_cookie(request.headers(), &state.cookies.access).map(str::to_string);
    let refresh = get_cookie(request.headers(), &state.cookies.refresh).map(str::to_string);
    let path = request.uri().path().to_string();

    let decision = evaluate(
        access.as_deref(),
        refresh.as_deref(),
        &path,
        &state.routes,
        unix_now(),
    );

    match decision {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Tag(signal) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                REFRESH_SIGNAL_HEADER,
                HeaderValue::from_static(signal.header_value()),
            );
            response
        }
        GateDecision::RedirectToLogin {
            location,
            clear_access,
        } => {
            debug!(path = %path, clear_access, "edge gate redirecting to login");
            let mut response = Redirect::temporary(&location).into_response();
            if clear_access {
                // Invalidate access-side state only; the refresh cookie's
                // lifecycle belongs to the refresh path.
                let headers = response.headers_mut();
                for cookie in [
                    clear_cookie(&state.cookies.access, state.secure_cookies),
                    clear_cookie(&state.cookies.expires_at, state.secure_cookies),
                ] {
                    if let Ok(value) = HeaderValue::from_str(&cookie) {
                        headers.append(SET_COOKIE, value);
                    }
                }
            }
            response
        }
        GateDecision::RedirectHome { location } => {
            debug!(path = %path, "edge gate redirecting authenticated user away");
            Redirect::temporary(&location).into_response()
        }
    }
}
