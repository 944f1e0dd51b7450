//! Unverified JWT expiry inspection.
//!
//! Decodes a bearer token's payload without checking the signature and
//! reduces it to the single `exp` claim. This is a UX/routing heuristic
//! only: authorization is re-checked by the upstream backend on every
//! request, so a forged `exp` buys nothing but a wasted redirect.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Remaining lifetime below which a token should be proactively refreshed.
pub const REFRESH_THRESHOLD_SECS: i64 = 300;

/// Remaining lifetime below which the UI should start warning.
pub const WARN_THRESHOLD_SECS: i64 = 600;

/// Current wall-clock time as Unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Decode a JWT payload without verifying the signature.
///
/// Splits on `.` (exactly three segments required), base64url-decodes the
/// middle segment, and parses it as a JSON object. Returns `None` on any
/// malformed input; never panics.
pub fn decode(token: &str) -> Option<serde_json::Value> {
    let mut segments = token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Tolerate padded producers; the engine expects unpadded input.
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.is_object().then_some(value)
}

/// Extract the `exp` claim (Unix seconds) from a token, if decodable.
///
/// The claim set is treated as an untyped mapping and reduced to this one
/// field; no other claim structure is assumed.
pub fn token_expiry(token: &str) -> Option<i64> {
    decode(token)?.get("exp")?.as_i64()
}

/// Whether a token is live but inside the proactive-refresh window.
///
/// `false` for already-expired or undecodable tokens; those are handled by
/// the expiry branch of whichever consumer asks.
pub fn should_refresh_proactively(token: &str, now: i64) -> bool {
    match token_expiry(token) {
        Some(exp) => {
            let remaining = exp - now;
            remaining > 0 && remaining < REFRESH_THRESHOLD_SECS
        }
        None => false,
    }
}

/// Derived expiry verdict for one evaluation cycle.
///
/// Recomputed on every poll/inspection and never cached beyond it. A missing
/// or undecodable expiry yields the fail-closed default: expired and due for
/// refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenExpiryFact {
    /// Expiry instant (Unix seconds), if one could be decoded.
    pub expires_at: Option<i64>,
    /// Seconds until expiry; non-positive once expired.
    pub remaining_seconds: i64,
    /// Token lifetime has elapsed.
    pub is_expired: bool,
    /// Remaining lifetime is inside the refresh threshold.
    pub should_refresh: bool,
    /// Remaining lifetime is inside the warn threshold.
    pub should_warn: bool,
}

impl TokenExpiryFact {
    /// Fail-closed default: treat the session as expired and refresh-due.
    pub fn expired() -> Self {
        Self {
            expires_at: None,
            remaining_seconds: 0,
            is_expired: true,
            should_refresh: true,
            should_warn: true,
        }
    }

    /// Derive the fact from a known expiry instant.
    pub fn from_expiry(expires_at: Option<i64>, now: i64) -> Self {
        let Some(exp) = expires_at else {
            return Self::expired();
        };
        let remaining = exp - now;
        Self {
            expires_at: Some(exp),
            remaining_seconds: remaining,
            is_expired: remaining <= 0,
            should_refresh: remaining <= REFRESH_THRESHOLD_SECS,
            should_warn: remaining <= WARN_THRESHOLD_SECS,
        }
    }

    /// Derive the fact from a raw token string (fail-closed on decode error).
    pub fn from_token(token: &str, now: i64) -> Self {
        Self::from_expiry(token_expiry(token), now)
    }
}
