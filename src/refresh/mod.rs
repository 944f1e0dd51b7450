//! Proactive access-token renewal.
//!
//! Two independent consumers renew the session before it expires: a
//! timer-driven scheduler that fires at a fraction of the token's remaining
//! lifetime, and a polling status projector that doubles as a safety net.
//! Each owns its own cooldown gate; both call the same injected refresher.

mod gate;
mod projector;
mod scheduler;

pub use gate::{
    POLL_REFRESH_COOLDOWN, RefreshGate, RefreshPermit, SCHEDULED_REFRESH_COOLDOWN,
};
pub use projector::{
    ProjectorHandle, STATUS_POLL_INTERVAL, Severity, SessionIndicator, SessionStatus,
    format_remaining, spawn_status_projector,
};
pub use scheduler::{
    REFRESH_AT_FRACTION, SchedulerHandle, resolve_initial_ttl, spawn_refresh_scheduler,
};

use std::future::Future;

use crate::session::User;
use crate::token::TokenExpiryFact;

/// Boxed error at the collaborator seam; callers only care about
/// success vs failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a successful refresh call: the (replaced) user and the new
/// access token's lifetime in seconds.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub user: User,
    pub expires_in: u64,
}

/// The injected `refresh()` collaborator.
///
/// Must be idempotent-safe: redundant calls return a fresh valid token
/// either way. The token itself travels out of band (cookies); only the
/// user and the new lifetime come back here.
pub trait TokenRefresher: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = Result<RefreshedSession, BoxError>> + Send;
}

/// Capability invoked when a refresh fails terminally.
///
/// Treated as "session ended, force re-login" by the consumer.
pub trait SessionExpiryHandler: Send + Sync + 'static {
    fn on_session_expired(&self);
}

/// Source of the current expiry verdict (an external status endpoint).
pub trait SessionStatusSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<TokenExpiryFact, BoxError>> + Send;
}
