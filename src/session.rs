//! Client-side session state.
//!
//! The session is the pairing of the current user with the access token's
//! expiry instant. It is replaced wholesale on every login/refresh/logout;
//! there is no partial-update path.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;

/// User as reported by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Current user plus the access token's expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Seconds until the access token expires; non-positive once elapsed.
    pub fn remaining_seconds(&self, now: OffsetDateTime) -> i64 {
        (self.expires_at - now).whole_seconds()
    }
}

/// Owned session container with a replace-wholesale update discipline.
///
/// The only mutations are [`replace`](SessionStore::replace) and
/// [`clear`](SessionStore::clear). Readers take snapshots or subscribe to
/// changes; nothing hands out a mutable view of the inner state.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(None)),
        }
    }

    /// Replace the whole session (login, refresh).
    pub fn replace(&self, session: Session) {
        self.tx.send_replace(Some(session));
    }

    /// Drop the session (logout, terminal expiry).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Point-in-time copy of the current session.
    pub fn snapshot(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Observe session replacements.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
