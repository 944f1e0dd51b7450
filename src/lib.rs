pub mod api;
pub mod cli;
pub mod client;
pub mod edge;
pub mod rate_limit;
pub mod refresh;
pub mod session;
pub mod token;
pub mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, http::StatusCode, middleware, response::Html, routing::get};
use tokio::net::TcpListener;
use url::Url;

use edge::{CookieConfig, EdgeState, RouteConfig, edge_access_gate};
use upstream::{AuthBackend, HttpAuthBackend};

pub struct ServerConfig {
    /// Base URL of the auth backend (trailing slash expected)
    pub upstream: Url,
    /// Route classification for the edge gate
    pub routes: RouteConfig,
    /// Cookie names for the token triple
    pub cookies: CookieConfig,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let backend = Arc::new(HttpAuthBackend::new(config.upstream.clone()));
    create_app_with_backend(config, backend)
}

/// Create the application router with an injected auth backend.
/// Used directly by tests; `create_app` wires the HTTP backend.
pub fn create_app_with_backend<B: AuthBackend>(config: &ServerConfig, backend: Arc<B>) -> Router {
    let api_router = api::create_api_router(
        backend,
        config.upstream.clone(),
        config.cookies.clone(),
        config.secure_cookies,
    );

    let edge_state = Arc::new(EdgeState {
        routes: config.routes.clone(),
        cookies: config.cookies.clone(),
        secure_cookies: config.secure_cookies,
    });

    // Minimal shells at the page routes; the admin SPA itself renders
    // elsewhere. They exist so the gate's protected/auth-only semantics
    // apply to real handlers.
    let shells = Router::new()
        .route(&config.routes.login_path, get(login_shell))
        .route(&config.routes.home_path, get(dashboard_shell))
        .route(
            &format!("{}/{{*path}}", config.routes.home_path),
            get(dashboard_shell),
        );

    Router::new()
        .nest("/api", api_router)
        .merge(shells)
        .fallback(not_found)
        // The gate runs ahead of every handler, including the fallback.
        .layer(middleware::from_fn_with_state(edge_state, edge_access_gate))
}

async fn login_shell() -> Html<&'static str> {
    Html("<!doctype html><html><head><title>Sign in</title></head><body><div id=\"login-root\"></div></body></html>")
}

async fn dashboard_shell() -> Html<&'static str> {
    Html("<!doctype html><html><head><title>Admin</title></head><body><div id=\"admin-root\"></div></body></html>")
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
