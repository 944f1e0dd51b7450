//! Cooldown gate against concurrent or overly-frequent refresh attempts.

use std::time::Duration;
use tokio::time::Instant;

/// Cooldown for the polling-status consumer.
pub const POLL_REFRESH_COOLDOWN: Duration = Duration::from_secs(2);

/// Cooldown for the scheduled-timer consumer.
pub const SCHEDULED_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

/// Guard allowing at most one in-flight refresh per owner, and no new
/// attempt within the cooldown of the previous attempt's start.
///
/// Each consumer owns its own instance; the gates are deliberately not
/// shared between the scheduler and the projector (different triggers,
/// different cooldowns, and neither may suppress the other).
#[derive(Debug)]
pub struct RefreshGate {
    cooldown: Duration,
    in_progress: bool,
    last_attempt_started_at: Option<Instant>,
}

impl RefreshGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            in_progress: false,
            last_attempt_started_at: None,
        }
    }

    /// Try to start an attempt at `now`.
    ///
    /// Refuses while a permit is live or within the cooldown of the previous
    /// acquire. The returned permit releases the gate on drop, so even an
    /// abandoned refresh future cannot wedge the gate.
    pub fn try_acquire(&mut self, now: Instant) -> Option<RefreshPermit<'_>> {
        if self.in_progress {
            return None;
        }
        if let Some(last) = self.last_attempt_started_at {
            if now.duration_since(last) < self.cooldown {
                return None;
            }
        }
        self.in_progress = true;
        self.last_attempt_started_at = Some(now);
        Some(RefreshPermit { gate: self })
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }
}

/// Live refresh attempt. Dropping it releases the gate regardless of the
/// attempt's outcome; the cooldown window keeps running from the acquire.
#[derive(Debug)]
pub struct RefreshPermit<'a> {
    gate: &'a mut RefreshGate,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        self.gate.in_progress = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_refused_while_in_progress() {
        let mut gate = RefreshGate::new(POLL_REFRESH_COOLDOWN);

        let permit = gate.try_acquire(Instant::now());
        assert!(permit.is_some());
        drop(permit);

        // Released, but still inside the cooldown window.
        assert!(gate.try_acquire(Instant::now()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires() {
        let mut gate = RefreshGate::new(POLL_REFRESH_COOLDOWN);

        drop(gate.try_acquire(Instant::now()));

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(gate.try_acquire(Instant::now()).is_none());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(gate.try_acquire(Instant::now()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_without_cooldown_elapsed_still_refused() {
        let mut gate = RefreshGate::new(SCHEDULED_REFRESH_COOLDOWN);

        {
            let _permit = gate.try_acquire(Instant::now());
        }
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(gate.try_acquire(Instant::now()).is_none());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(gate.try_acquire(Instant::now()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permit_drop_releases_abandoned_attempt() {
        let mut gate = RefreshGate::new(POLL_REFRESH_COOLDOWN);

        // Simulates a caller scope that vanished mid-flight: the permit is
        // dropped with the "network call" never resolving.
        let permit = gate.try_acquire(Instant::now());
        assert!(permit.is_some());
        drop(permit);
        assert!(!gate.is_in_progress());

        tokio::time::advance(POLL_REFRESH_COOLDOWN).await;
        assert!(gate.try_acquire(Instant::now()).is_some());
    }
}
