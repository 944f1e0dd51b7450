//! Request-level access gate.
//!
//! Evaluated once per inbound request before any handler: decide between
//! allow, redirect-to-login, redirect-away, or tagging the response with a
//! refresh signal, from nothing but the token cookies and the path.

mod cookie;
mod gate;
mod middleware;
mod routes;

pub use cookie::{
    CookieConfig, clear_cookie, get_cookie, parse_expiry_cookie, set_access_cookie,
    set_expiry_cookie, set_refresh_cookie,
};
pub use gate::{GateDecision, REFRESH_SIGNAL_HEADER, RefreshSignal, evaluate};
pub use middleware::{EdgeState, edge_access_gate};
pub use routes::{RouteClass, RouteConfig};
