//! Configuration structures.
//!
//! Configuration is loaded from an optional JSON file, then overridden by
//! command-line flags and environment variables (see `main.rs`).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use super::errors::{Error, Result};

/// Global gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Request guard configuration.
    #[serde(default)]
    pub guard: GuardConfig,

    /// Rate limiter configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Backend collaborator endpoints.
    #[serde(default)]
    pub backends: BackendsConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Reject configurations the gateway cannot serve safely.
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::config(format!("invalid listen_addr '{}': {}", self.server.listen_addr, e)))?;

        if self.guard.api_keys.iter().all(|k| k.is_empty()) {
            return Err(Error::config("at least one non-empty API key is required"));
        }
        if self.rate_limit.limit == 0 {
            return Err(Error::config("rate_limit.limit must be positive"));
        }
        if self.rate_limit.window.is_zero() {
            return Err(Error::config("rate_limit.window must be positive"));
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub listen_addr: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Upper bound on a single tool call. Calls exceeding it are aborted.
    #[serde(with = "humantime_serde")]
    pub handler_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8787".to_string(),
            max_body_bytes: 1024 * 1024,
            handler_timeout: Duration::from_secs(30),
        }
    }
}

/// Request guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// API keys accepted in the `x-api-key` header.
    pub api_keys: Vec<String>,

    /// Browser origins accepted in the `origin` header. Requests without an
    /// origin are not subject to this list.
    pub allowed_origins: Vec<String>,

    /// Reject requests that do not declare `x-forwarded-proto: https`.
    pub require_secure_transport: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            allowed_origins: Vec::new(),
            require_secure_transport: true,
        }
    }
}

/// Fixed-window rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window.
    pub limit: u32,

    /// Window length.
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// How often expired windows are evicted.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Base URLs of the backend collaborators. A backend without a URL still has
/// its tools registered; calling them reports the backend as unconfigured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub document_store: Option<String>,
    pub file_store: Option<String>,
    pub code_host: Option<String>,
    pub web_search: Option<String>,

    /// Per-request timeout for HTTP collaborators.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            document_store: None,
            file_store: None,
            code_host: None,
            web_search: None,
            request_timeout: Duration::from_secs(20),
        }
    }
}
