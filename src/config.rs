//! Configuration loader for the `weather-station-api` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, net::SocketAddr, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional environment variable into `$ty`, falling back to a default.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable, treating blank as unset.
macro_rules! optional_env {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Only origin allowed by CORS. `None` mirrors the request origin.
    pub frontend_origin: Option<String>,

    /// Lower-cased emails allowed to log in. Empty allows everyone.
    pub allowlist: Vec<String>,

    /// `Domain=` attribute for the session cookie.
    pub cookie_domain: Option<String>,

    /// Mark the session cookie `Secure` (and `SameSite=None`).
    pub cookie_secure: bool,

    /// How long a session stays valid after login.
    pub session_ttl: Duration,

    /// Open-Meteo API base, without trailing slash.
    pub open_meteo_base_url: String,

    /// Per-request timeout for upstream weather calls.
    pub upstream_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8787)),
            frontend_origin: None,
            allowlist: Vec::new(),
            cookie_domain: None,
            cookie_secure: false,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            open_meteo_base_url: DEFAULT_OPEN_METEO_BASE_URL.to_string(),
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_ADDR` – listen address (default: 0.0.0.0:8787)
/// - `FRONTEND_ORIGIN` – CORS origin (default: mirror request origin)
/// - `ALLOWLIST_EMAILS` – comma-separated login allowlist (default: empty)
/// - `COOKIE_DOMAIN` – session cookie domain (default: none)
/// - `COOKIE_SECURE` – `true|false|1|0|yes|no` (default: false)
/// - `SESSION_TTL_SECS` – session lifetime (default: 86400)
/// - `OPEN_METEO_BASE_URL` – weather provider base (default: public API)
/// - `UPSTREAM_TIMEOUT_SECS` – weather request timeout (default: 10)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    from_lookup(|name| env::var(name).ok())
}

/// Build a [`Config`] from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let bind_addr = parse_env!(
        lookup,
        "BIND_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 8787))
    );
    let frontend_origin = optional_env!(lookup, "FRONTEND_ORIGIN");
    let allowlist = parse_allowlist(&lookup("ALLOWLIST_EMAILS").unwrap_or_default());
    let cookie_domain = optional_env!(lookup, "COOKIE_DOMAIN");
    let cookie_secure = match lookup("COOKIE_SECURE") {
        Some(v) => parse_bool(&v).ok_or_else(|| anyhow!("Invalid COOKIE_SECURE: {}", v))?,
        None => false,
    };
    let session_ttl_secs = parse_env!(lookup, "SESSION_TTL_SECS", u64, 24 * 60 * 60);
    let open_meteo_base_url = optional_env!(lookup, "OPEN_METEO_BASE_URL")
        .unwrap_or_else(|| DEFAULT_OPEN_METEO_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    let upstream_timeout_secs = parse_env!(lookup, "UPSTREAM_TIMEOUT_SECS", u64, 10);

    Ok(Config {
        bind_addr,
        frontend_origin,
        allowlist,
        cookie_domain,
        cookie_secure,
        session_ttl: Duration::from_secs(session_ttl_secs),
        open_meteo_base_url,
        upstream_timeout: Duration::from_secs(upstream_timeout_secs),
    })
}

/// Split a comma-separated email list into trimmed, lower-cased entries.
pub fn parse_allowlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let allowlist = if self.allowlist.is_empty() {
            "(anyone)".to_string()
        } else {
            self.allowlist.join(",")
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_ADDR             : {}", self.bind_addr);
        tracing::info!(
            "  FRONTEND_ORIGIN       : {}",
            self.frontend_origin.as_deref().unwrap_or("(mirror)")
        );
        tracing::info!("  ALLOWLIST_EMAILS      : {}", allowlist);
        tracing::info!(
            "  COOKIE_DOMAIN         : {}",
            self.cookie_domain.as_deref().unwrap_or("(none)")
        );
        tracing::info!("  COOKIE_SECURE         : {}", self.cookie_secure);
        tracing::info!("  SESSION_TTL_SECS      : {}", self.session_ttl.as_secs());
        tracing::info!("  OPEN_METEO_BASE_URL   : {}", self.open_meteo_base_url);
        tracing::info!("  UPSTREAM_TIMEOUT_SECS : {}", self.upstream_timeout.as_secs());
    }
}
