//! Cookie names, parsing, and Set-Cookie builders.

use axum::http::header;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Configurable cookie names for the token triple.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Access-token cookie (HttpOnly).
    pub access: String,
    /// Refresh-token cookie (HttpOnly).
    pub refresh: String,
    /// Expiry-timestamp cookie, RFC 3339. Client-readable so the scheduler
    /// can derive a startup TTL before any in-memory state exists.
    pub expires_at: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access: "auth_token".into(),
            refresh: "refresh_token".into(),
            expires_at: "token_expires_at".into(),
        }
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

fn secure_suffix(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}

/// Set-Cookie for the access token.
pub fn set_access_cookie(name: &str, token: &str, max_age: u64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name,
        token,
        max_age,
        secure_suffix(secure)
    )
}

/// Set-Cookie for the refresh token.
pub fn set_refresh_cookie(name: &str, token: &str, max_age: u64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name,
        token,
        max_age,
        secure_suffix(secure)
    )
}

/// Set-Cookie for the expiry timestamp. Deliberately not HttpOnly.
pub fn set_expiry_cookie(
    name: &str,
    expires_at: OffsetDateTime,
    max_age: u64,
    secure: bool,
) -> String {
    let value = expires_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::new());
    format!(
        "{}={}; SameSite=Lax; Path=/; Max-Age={}{}",
        name,
        value,
        max_age,
        secure_suffix(secure)
    )
}

/// Set-Cookie that removes a cookie.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    format!(
        "{}=; SameSite=Lax; Path=/; Max-Age=0{}",
        name,
        secure_suffix(secure)
    )
}

/// Parse the expiry cookie's RFC 3339 value.
pub fn parse_expiry_cookie(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}
