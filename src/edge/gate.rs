//! Per-request access decision.
//!
//! Pure function of the two token cookies and the request path. Runs ahead
//! of every handler, independent of (and redundant with) the client-side
//! scheduler, as defense in depth. Malformed tokens always count as expired.

use super::routes::{RouteClass, RouteConfig};
use crate::token::{TokenExpiryFact, should_refresh_proactively};

/// Response header carrying the refresh signal on API routes.
pub const REFRESH_SIGNAL_HEADER: &str = "x-token-refresh";

/// Degree of urgency signalled to downstream handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSignal {
    /// Token is live but inside the refresh window.
    Recommended,
    /// Token is expired but a refresh token is available.
    Required,
}

impl RefreshSignal {
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Required => "required",
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Let the request through and tag the response.
    Tag(RefreshSignal),
    /// Send to the login page; optionally invalidate access-side cookies.
    /// The refresh cookie is never cleared here - its lifecycle belongs to
    /// the refresh path, not the edge.
    RedirectToLogin { location: String, clear_access: bool },
    /// Already authenticated on an auth-only page; send home.
    RedirectHome { location: String },
}

/// Evaluate one inbound request.
pub fn evaluate(
    access: Option<&str>,
    refresh: Option<&str>,
    path: &str,
    routes: &RouteConfig,
    now: i64,
) -> GateDecision {
    match routes.classify(path) {
        RouteClass::Api => {
            let Some(token) = access else {
                // Missing token on an API route is the handler's call.
                return GateDecision::Allow;
            };
            if should_refresh_proactively(token, now) {
                return GateDecision::Tag(RefreshSignal::Recommended);
            }
            let fact = TokenExpiryFact::from_token(token, now);
            if fact.is_expired && refresh.is_some() {
                GateDecision::Tag(RefreshSignal::Required)
            } else {
                GateDecision::Allow
            }
        }
        RouteClass::Protected => {
            let Some(token) = access else {
                return GateDecision::RedirectToLogin {
                    location: login_location(routes, path),
                    clear_access: false,
                };
            };
            let fact = TokenExpiryFact::from_token(token, now);
            if !fact.is_expired {
                GateDecision::Allow
            } else if refresh.is_some() {
                // Expired but refreshable: let the request through so a
                // handler or the client performs the refresh.
                GateDecision::Allow
            } else {
                GateDecision::RedirectToLogin {
                    location: login_location(routes, path),
                    clear_access: true,
                }
            }
        }
        RouteClass::AuthOnly => match access {
            Some(token) if !TokenExpiryFact::from_token(token, now).is_expired => {
                GateDecision::RedirectHome {
                    location: routes.home_path.clone(),
                }
            }
            _ => GateDecision::Allow,
        },
        RouteClass::Open => GateDecision::Allow,
    }
}

fn login_location(routes: &RouteConfig, requested: &str) -> String {
    format!("{}?redirect={}", routes.login_path, requested)
}
