//! Resource passthrough to the upstream backend.
//!
//! The admin panel's users/roles/permissions tables are plain CRUD against
//! the auth backend; the BFF's job is only to translate the access cookie
//! into a bearer header and relay the rest untouched.

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{
        StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::any,
};
use tracing::error;
use url::Url;

use super::error::ApiError;
use crate::edge::{CookieConfig, get_cookie};

/// Largest request body the proxy will buffer for forwarding.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct ProxyState {
    pub http: reqwest::Client,
    pub upstream: Url,
    pub cookies: CookieConfig,
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/{*path}", any(forward))
        .with_state(state)
}

/// Relay one request upstream and its response back.
async fn forward(
    State(state): State<ProxyState>,
    axum::extract::Path(path): axum::extract::Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let mut target = state
        .upstream
        .join(&format!("v1/{}", path))
        .map_err(|e| {
            error!(path = %path, error = %e, "cannot build upstream url");
            ApiError::bad_request("Invalid resource path")
        })?;
    target.set_query(parts.uri.query());

    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::bad_request("Request body too large"))?;

    let mut upstream_request = state.http.request(parts.method.clone(), target);
    if let Some(token) = get_cookie(&parts.headers, &state.cookies.access) {
        upstream_request = upstream_request.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(content_type) = parts.headers.get(CONTENT_TYPE) {
        upstream_request = upstream_request.header(CONTENT_TYPE, content_type.clone());
    }

    let upstream_response = upstream_request.body(bytes).send().await.map_err(|e| {
        error!(error = %e, "upstream request failed");
        ApiError::internal("Upstream unavailable")
    })?;

    let status = StatusCode::from_u16(upstream_response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream_response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let payload = upstream_response.bytes().await.map_err(|e| {
        error!(error = %e, "failed reading upstream response");
        ApiError::internal("Upstream unavailable")
    })?;

    let mut response = (status, Body::from(payload)).into_response();
    if let Some(content_type) = content_type {
        if let Ok(value) = axum::http::HeaderValue::from_str(&content_type) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    Ok(response)
}
