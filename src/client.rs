//! HTTP collaborators for the client-side lifecycle subsystem.
//!
//! A native client embedding the scheduler and projector talks to the BFF
//! with a cookie-holding HTTP client: the refresh token never surfaces in
//! code, it rides the jar. These impls satisfy the collaborator traits the
//! scheduler and projector are injected with.

use serde::Deserialize;
use url::Url;

use crate::refresh::{BoxError, RefreshedSession, SessionStatusSource, TokenRefresher};
use crate::session::User;
use crate::token::TokenExpiryFact;

/// Body of the BFF's login/refresh responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionEnvelope {
    user: User,
    expires_in: u64,
}

/// Cookie-jar HTTP client bound to a BFF base URL.
#[derive(Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base: Url,
}

impl SessionClient {
    /// # Errors
    ///
    /// Returns the underlying builder error if the HTTP client cannot be
    /// constructed.
    pub fn new(base: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BoxError> {
        self.base.join(path).map_err(|e| Box::new(e) as BoxError)
    }

    /// Log in and seed the cookie jar with the session triple.
    pub async fn login(&self, email: &str, password: &str) -> Result<RefreshedSession, BoxError> {
        let response = self
            .http
            .post(self.endpoint("api/auth/login")?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?
            .error_for_status()?;
        let envelope: SessionEnvelope = response.json().await?;
        Ok(RefreshedSession {
            user: envelope.user,
            expires_in: envelope.expires_in,
        })
    }

    /// Clear the server-side session; the jar picks up the cookie clears.
    pub async fn logout(&self) -> Result<(), BoxError> {
        self.http
            .post(self.endpoint("api/auth/logout")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl TokenRefresher for SessionClient {
    async fn refresh(&self) -> Result<RefreshedSession, BoxError> {
        let response = self
            .http
            .post(self.endpoint("api/auth/refresh")?)
            .send()
            .await?
            .error_for_status()?;
        let envelope: SessionEnvelope = response.json().await?;
        Ok(RefreshedSession {
            user: envelope.user,
            expires_in: envelope.expires_in,
        })
    }
}

impl SessionStatusSource for SessionClient {
    async fn fetch(&self) -> Result<TokenExpiryFact, BoxError> {
        let response = self
            .http
            .get(self.endpoint("api/auth/session")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_deserializes_camel_case() {
        let envelope: SessionEnvelope = serde_json::from_str(
            r#"{
                "user": {"id":"u-1","name":"Alice","email":"a@example.com"},
                "expiresIn": 300
            }"#,
        )
        .unwrap();
        assert_eq!(envelope.user.id, "u-1");
        assert_eq!(envelope.expires_in, 300);
    }
}
