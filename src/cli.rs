//! CLI argument parsing, validation, and startup helpers.

use clap::Parser;
use tracing::error;
use url::Url;

use crate::ServerConfig;
use crate::edge::{CookieConfig, RouteConfig};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Rookgate",
    about = "RBAC admin-panel BFF with proactive access-token refresh"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7392")]
    pub port: u16,

    /// Base URL of the auth backend, e.g. "http://localhost:8000/api/"
    #[arg(long, env = "ROOKGATE_UPSTREAM")]
    pub upstream: String,

    /// Route prefix that requires an authenticated session (repeatable)
    #[arg(long = "protected-prefix", default_value = "/dashboard")]
    pub protected_prefixes: Vec<String>,

    /// Route prefix for login/register surfaces (repeatable)
    #[arg(long = "auth-prefix", default_value = "/auth")]
    pub auth_prefixes: Vec<String>,

    /// Route prefix eligible for refresh-signal tagging (repeatable)
    #[arg(long = "api-prefix", default_value = "/api")]
    pub api_prefixes: Vec<String>,

    /// Login page path, the redirect target for unauthenticated users
    #[arg(long, default_value = "/auth/login", value_parser = validate_page_path)]
    pub login_path: String,

    /// Landing page for already-authenticated users
    #[arg(long, default_value = "/dashboard", value_parser = validate_page_path)]
    pub home_path: String,

    /// Access-token cookie name
    #[arg(long, default_value = "auth_token")]
    pub access_cookie: String,

    /// Refresh-token cookie name
    #[arg(long, default_value = "refresh_token")]
    pub refresh_cookie: String,

    /// Expiry-timestamp cookie name (client-readable)
    #[arg(long, default_value = "token_expires_at")]
    pub expires_cookie: String,

    /// Set the Secure flag on cookies (use behind HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_page_path(s: &str) -> Result<String, String> {
    if !s.starts_with('/') {
        return Err(format!("Path must start with '/': {}", s));
    }

    if s.len() > 1 && s.ends_with('/') {
        return Err(format!("Path must not end with '/': {}", s));
    }

    if s.chars().any(|c| !c.is_ascii() || c.is_whitespace()) {
        return Err(format!("Path contains invalid characters: {}", s));
    }

    Ok(s.to_string())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Parse and validate the upstream base URL.
/// Returns None and logs an error if validation fails.
pub fn validate_upstream(upstream: &str) -> Option<Url> {
    let mut url = match Url::parse(upstream) {
        Ok(url) => url,
        Err(e) => {
            error!(upstream = %upstream, error = %e, "Invalid upstream URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));

    if !is_https && !is_local {
        error!("Upstream must use HTTPS for non-localhost deployments");
        return None;
    }

    // Joining relative endpoints drops the last path segment unless the
    // base ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, upstream: Url) -> ServerConfig {
    ServerConfig {
        upstream,
        routes: RouteConfig {
            protected: args.protected_prefixes.clone(),
            auth_only: args.auth_prefixes.clone(),
            api: args.api_prefixes.clone(),
            login_path: args.login_path.clone(),
            home_path: args.home_path.clone(),
        },
        cookies: CookieConfig {
            access: args.access_cookie.clone(),
            refresh: args.refresh_cookie.clone(),
            expires_at: args.expires_cookie.clone(),
        },
        secure_cookies: args.secure_cookies,
    }
}
