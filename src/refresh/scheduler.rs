//! Timer-driven proactive refresh.
//!
//! One logical timer slot: arming always cancels any pending timer first,
//! so exactly one scheduled refresh exists at a time. The timer fires at
//! 75% of the token's remaining lifetime, leaving a retry window before
//! hard expiry if the first attempt fails.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use super::gate::{RefreshGate, SCHEDULED_REFRESH_COOLDOWN};
use super::{SessionExpiryHandler, TokenRefresher};
use crate::session::{Session, SessionStore};

/// Fraction of the remaining lifetime to let elapse before refreshing.
pub const REFRESH_AT_FRACTION: f64 = 0.75;

enum Command {
    /// A fresh remaining-TTL became known (hydration, login, refresh).
    TtlUpdate(i64),
    /// The document/window became visible again.
    Visible,
}

/// Handle to a running scheduler task.
///
/// Dropping the handle tears the task down, cancelling any armed timer.
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
    task: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    /// Arm (or re-arm) the timer from a freshly known remaining TTL.
    /// Non-positive TTLs attempt a refresh immediately instead.
    pub fn arm(&self, remaining_seconds: i64) {
        let _ = self.tx.send(Command::TtlUpdate(remaining_seconds));
    }

    /// Re-evaluate the session now that the tab/process is visible again.
    /// Guards against timers that never fired while suspended.
    pub fn visibility_regained(&self) {
        let _ = self.tx.send(Command::Visible);
    }

    /// Stop the scheduler and cancel any pending timer.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Resolve the TTL to arm with at startup.
///
/// An in-memory TTL wins; otherwise the remaining lifetime is derived from
/// a persisted expiry instant (the client-readable expiry cookie). `None`
/// means unauthenticated: perform no action.
pub fn resolve_initial_ttl(
    in_memory: Option<i64>,
    persisted_expires_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Option<i64> {
    in_memory.or_else(|| persisted_expires_at.map(|at| (at - now).whole_seconds()))
}

/// Spawn the scheduler task.
///
/// On success the store is replaced wholesale with the refreshed session
/// and the timer re-arms from the new TTL. On failure the store is cleared
/// and `on_expired` fires (hard logout signal); the scheduler then idles
/// until externally re-armed.
pub fn spawn_refresh_scheduler<R, H>(
    store: SessionStore,
    refresher: R,
    on_expired: H,
) -> SchedulerHandle
where
    R: TokenRefresher,
    H: SessionExpiryHandler,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(rx, store, refresher, on_expired));
    SchedulerHandle { tx, task }
}

fn deadline_for(remaining_seconds: i64) -> Instant {
    let delay = Duration::from_secs_f64(remaining_seconds as f64 * REFRESH_AT_FRACTION);
    Instant::now() + delay
}

async fn run<R, H>(
    mut rx: mpsc::UnboundedReceiver<Command>,
    store: SessionStore,
    refresher: R,
    on_expired: H,
) where
    R: TokenRefresher,
    H: SessionExpiryHandler,
{
    let mut gate = RefreshGate::new(SCHEDULED_REFRESH_COOLDOWN);
    // The single timer slot; Some = Armed, None = Idle.
    let mut deadline: Option<Instant> = None;
    let mut attempt_now = false;

    loop {
        let fire = if attempt_now {
            attempt_now = false;
            true
        } else {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(Command::TtlUpdate(secs)) => {
                        if secs <= 0 {
                            deadline = None;
                            true
                        } else {
                            deadline = Some(deadline_for(secs));
                            debug!(remaining_seconds = secs, "refresh timer armed");
                            false
                        }
                    }
                    Some(Command::Visible) => match store.snapshot() {
                        Some(session) => {
                            let remaining =
                                session.remaining_seconds(OffsetDateTime::now_utc());
                            if remaining <= 0 {
                                deadline = None;
                                true
                            } else {
                                deadline = Some(deadline_for(remaining));
                                debug!(
                                    remaining_seconds = remaining,
                                    "refresh timer re-armed on visibility"
                                );
                                false
                            }
                        }
                        // Unauthenticated; nothing to schedule.
                        None => false,
                    },
                    None => break,
                },
                _ = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => true,
            }
        };

        if !fire {
            continue;
        }
        deadline = None;

        let Some(permit) = gate.try_acquire(Instant::now()) else {
            debug!("refresh attempt suppressed by gate");
            continue;
        };

        let outcome = refresher.refresh().await;
        drop(permit);

        match outcome {
            Ok(refreshed) => {
                let expires_in = refreshed.expires_in as i64;
                store.replace(Session {
                    user: refreshed.user,
                    expires_at: OffsetDateTime::now_utc()
                        + time::Duration::seconds(expires_in),
                });
                info!(expires_in, "access token refreshed");
                if expires_in > 0 {
                    deadline = Some(deadline_for(expires_in));
                } else {
                    attempt_now = true;
                }
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed; ending session");
                store.clear();
                on_expired.on_session_expired();
            }
        }
    }
}
