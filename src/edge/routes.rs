//! Route classification for the edge gate.

/// Auth posture of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Eligible for proactive-refresh tagging; never redirected here.
    Api,
    /// Login/register surfaces; authenticated users are redirected away.
    AuthOnly,
    /// Requires an authenticated session.
    Protected,
    /// Passes through unconditionally.
    Open,
}

/// String-prefix route sets plus the two redirect targets.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub protected: Vec<String>,
    pub auth_only: Vec<String>,
    pub api: Vec<String>,
    /// Where unauthenticated users are sent.
    pub login_path: String,
    /// Where already-authenticated users land when they hit an auth-only page.
    pub home_path: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            protected: vec!["/dashboard".into()],
            auth_only: vec!["/auth".into()],
            api: vec!["/api".into()],
            login_path: "/auth/login".into(),
            home_path: "/dashboard".into(),
        }
    }
}

impl RouteConfig {
    /// Classify a request path by prefix. Precedence: api, then auth-only,
    /// then protected. The defaults are disjoint; the order only matters
    /// for overlapping custom prefixes, where tagging (non-intrusive) wins
    /// over redirecting.
    pub fn classify(&self, path: &str) -> RouteClass {
        if matches_prefix(&self.api, path) {
            RouteClass::Api
        } else if matches_prefix(&self.auth_only, path) {
            RouteClass::AuthOnly
        } else if matches_prefix(&self.protected, path) {
            RouteClass::Protected
        } else {
            RouteClass::Open
        }
    }
}

fn matches_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}
