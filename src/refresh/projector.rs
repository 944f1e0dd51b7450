//! Polled session-status projection.
//!
//! Every second the projector fetches the current expiry verdict from a
//! status source and projects it into one of four mutually exclusive UI
//! states. Fetch failures substitute the fail-closed verdict rather than
//! preserving the last known good one. Independently of rendering, the
//! projector triggers its own gated refresh whenever the verdict says the
//! token is due or expired, as a safety net beside the scheduler's timer.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, interval};
use tracing::{debug, warn};

use super::gate::{POLL_REFRESH_COOLDOWN, RefreshGate};
use super::{SessionStatusSource, TokenRefresher};
use crate::token::TokenExpiryFact;

/// Cadence of the status poll.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Indicator color, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Red,
    Orange,
    Yellow,
    Green,
}

/// Discrete UI state, evaluated expired > refresh-due > warn > active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIndicator {
    Expired,
    RefreshDue,
    ExpiringSoon,
    Active,
}

impl SessionIndicator {
    pub fn project(fact: &TokenExpiryFact) -> Self {
        if fact.is_expired {
            Self::Expired
        } else if fact.should_refresh {
            Self::RefreshDue
        } else if fact.should_warn {
            Self::ExpiringSoon
        } else {
            Self::Active
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Expired => "Session expired",
            Self::RefreshDue => "Renewing session",
            Self::ExpiringSoon => "Session expiring soon",
            Self::Active => "Session active",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Expired => Severity::Red,
            Self::RefreshDue => Severity::Orange,
            Self::ExpiringSoon => Severity::Yellow,
            Self::Active => Severity::Green,
        }
    }
}

/// One projected status sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub indicator: SessionIndicator,
    /// Human-readable remaining time, e.g. `4m 32s`.
    pub remaining: String,
    pub fact: TokenExpiryFact,
}

impl SessionStatus {
    fn from_fact(fact: TokenExpiryFact) -> Self {
        Self {
            indicator: SessionIndicator::project(&fact),
            remaining: format_remaining(fact.remaining_seconds),
            fact,
        }
    }
}

/// Render a second count for the status indicator.
pub fn format_remaining(seconds: i64) -> String {
    if seconds <= 0 {
        return "0s".to_string();
    }
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Handle to a running projector task; dropping it stops the poll.
pub struct ProjectorHandle {
    rx: watch::Receiver<SessionStatus>,
    task: tokio::task::JoinHandle<()>,
}

impl ProjectorHandle {
    /// Latest projected status.
    pub fn status(&self) -> SessionStatus {
        self.rx.borrow().clone()
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.rx.clone()
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for ProjectorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the status-poll task.
pub fn spawn_status_projector<S, R>(source: S, refresher: R) -> ProjectorHandle
where
    S: SessionStatusSource,
    R: TokenRefresher,
{
    let (tx, rx) = watch::channel(SessionStatus::from_fact(TokenExpiryFact::expired()));
    let task = tokio::spawn(run(tx, source, refresher));
    ProjectorHandle { rx, task }
}

async fn run<S, R>(tx: watch::Sender<SessionStatus>, source: S, refresher: R)
where
    S: SessionStatusSource,
    R: TokenRefresher,
{
    let mut gate = RefreshGate::new(POLL_REFRESH_COOLDOWN);
    let mut ticker = interval(STATUS_POLL_INTERVAL);

    loop {
        ticker.tick().await;

        let fact = match source.fetch().await {
            Ok(fact) => fact,
            Err(e) => {
                // Err toward prompting re-authentication, never toward a
                // stale "all good" indicator.
                debug!(error = %e, "status fetch failed; assuming expired");
                TokenExpiryFact::expired()
            }
        };

        let due = fact.should_refresh || fact.is_expired;
        tx.send_replace(SessionStatus::from_fact(fact));

        if due {
            let Some(permit) = gate.try_acquire(Instant::now()) else {
                continue;
            };
            let outcome = refresher.refresh().await;
            drop(permit);
            match outcome {
                // The next poll observes the new expiry; nothing to do here.
                Ok(_) => debug!("poll-triggered refresh succeeded"),
                Err(e) => warn!(error = %e, "poll-triggered refresh failed"),
            }
        }
    }
}
