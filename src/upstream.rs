//! Pluggable auth-backend contract.
//!
//! The BFF is stateless: login, refresh, and revocation are owned by a
//! downstream auth service (Laravel, Symfony, and Node backends all speak
//! the same minimal JSON shape). Only the contract the token lifecycle
//! needs is modelled here.

use std::future::Future;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::session::User;

/// Credentials forwarded verbatim to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login/refresh response from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
    pub user: User,
    pub access_token: String,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access-token lifetime in seconds.
    pub expires_in: u64,
}

/// Errors talking to the auth backend.
#[derive(Debug)]
pub enum UpstreamError {
    /// Transport or decode failure.
    Http(reqwest::Error),
    /// Backend answered with a non-success status.
    Status(StatusCode),
    /// The configured base URL cannot produce the endpoint.
    Url(url::ParseError),
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamError::Http(e) => write!(f, "upstream request failed: {}", e),
            UpstreamError::Status(status) => write!(f, "upstream returned {}", status),
            UpstreamError::Url(e) => write!(f, "invalid upstream endpoint: {}", e),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpstreamError::Http(e) => Some(e),
            UpstreamError::Url(e) => Some(e),
            UpstreamError::Status(_) => None,
        }
    }
}

impl UpstreamError {
    /// Whether the backend explicitly rejected the credentials/token.
    pub fn is_rejection(&self) -> bool {
        match self {
            UpstreamError::Status(status) => matches!(status.as_u16(), 401 | 403 | 422),
            _ => false,
        }
    }
}

/// The auth backend as seen by the BFF.
pub trait AuthBackend: Send + Sync + 'static {
    /// Exchange credentials for a session grant.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<SessionGrant, UpstreamError>> + Send;

    /// Exchange a refresh token for a fresh grant. Idempotent-safe:
    /// redundant calls return a fresh valid grant either way.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<SessionGrant, UpstreamError>> + Send;

    /// Best-effort revocation on logout.
    fn logout(
        &self,
        access_token: Option<&str>,
    ) -> impl Future<Output = Result<(), UpstreamError>> + Send;
}

/// JSON-over-HTTP implementation against a configured base URL.
#[derive(Clone)]
pub struct HttpAuthBackend {
    http: reqwest::Client,
    base: Url,
}

impl HttpAuthBackend {
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
        self.base.join(path).map_err(UpstreamError::Url)
    }

    async fn grant_from(&self, response: reqwest::Response) -> Result<SessionGrant, UpstreamError> {
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }
        response.json().await.map_err(UpstreamError::Http)
    }
}

impl AuthBackend for HttpAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<SessionGrant, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint("auth/login")?)
            .json(request)
            .send()
            .await
            .map_err(UpstreamError::Http)?;
        self.grant_from(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionGrant, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint("auth/refresh")?)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(UpstreamError::Http)?;
        self.grant_from(response).await
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), UpstreamError> {
        let mut request = self.http.post(self.endpoint("auth/logout")?);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(UpstreamError::Http)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status(response.status()))
        }
    }
}
