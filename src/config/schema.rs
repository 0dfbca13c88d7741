//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! server. All types derive Serde traits for deserialization from TOML; the
//! `Default` impls carry the built-in per-environment route tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration for the edge server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind host, port, concurrency).
    pub listener: ListenerConfig,

    /// Built application served for non-API paths.
    pub static_files: StaticFilesConfig,

    /// Upstream timeouts and connection pool tuning.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route tables keyed by environment name.
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert("dev".to_string(), EnvironmentConfig::standard("http://127.0.0.1:8000"));
        environments.insert("pre".to_string(), EnvironmentConfig::standard("http://10.10.1.20:8000"));
        environments.insert("prod".to_string(), EnvironmentConfig::standard("http://10.10.0.10:8000"));

        Self {
            listener: ListenerConfig::default(),
            static_files: StaticFilesConfig::default(),
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
            environments,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listening port. Overridden by `PORT`.
    pub port: u16,

    /// Maximum requests processed concurrently; excess requests get 503.
    pub max_in_flight: usize,
}

impl ListenerConfig {
    /// Default port when neither the config file nor `PORT` set one.
    pub const DEFAULT_PORT: u16 = 8080;

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: Self::DEFAULT_PORT,
            max_in_flight: 10_000,
        }
    }
}

/// Location of the pre-built single-page application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory holding the build output. Relative paths resolve against the
    /// working directory at startup.
    pub root: PathBuf,

    /// Entry document served for client-side routes.
    pub entry_document: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            entry_document: "index.html".to_string(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for the upstream to produce response headers, in seconds.
    /// Zero disables the deadline.
    pub upstream_secs: u64,

    /// Idle pooled upstream connections are closed after this many seconds.
    pub pool_idle_secs: u64,

    /// Maximum idle pooled connections kept per upstream host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 0,
            pool_idle_secs: 90,
            pool_max_idle_per_host: 32,
        }
    }
}

/// Request limits applied before dispatch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Human-readable text or one JSON object per line.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "spa_edge=info,tower_http=info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Routes for a single environment, in match order.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub routes: Vec<RouteEntry>,
}

impl EnvironmentConfig {
    /// The table shape shared by every built-in environment: the REST API
    /// under `/api/` and the push channel under `/ws/`, both on one upstream.
    fn standard(target: &str) -> Self {
        Self {
            routes: vec![
                RouteEntry {
                    path_prefix: "/api/".to_string(),
                    target: target.to_string(),
                    rewrite: Some(RewriteRule::new("^/api", "/api")),
                    change_origin: true,
                    websocket: false,
                },
                RouteEntry {
                    path_prefix: "/ws/".to_string(),
                    target: target.to_string(),
                    rewrite: None,
                    change_origin: true,
                    websocket: true,
                },
            ],
        }
    }
}

/// A single API route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteEntry {
    /// Literal path prefix (must start with `/`).
    pub path_prefix: String,

    /// Upstream base URL (e.g., "http://127.0.0.1:8000").
    pub target: String,

    /// Optional rewrite of the matched prefix.
    #[serde(default)]
    pub rewrite: Option<RewriteRule>,

    /// Replace the `Host` header with the upstream authority.
    #[serde(default = "default_change_origin")]
    pub change_origin: bool,

    /// Allow WebSocket upgrades on this route.
    #[serde(default)]
    pub websocket: bool,
}

fn default_change_origin() -> bool {
    true
}

/// Prefix rewrite: `pattern` is `^` followed by a literal path prefix, which
/// is replaced by `replacement` when the request path starts with it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// The literal prefix the pattern anchors on, or `None` if the pattern
    /// is not anchored.
    pub fn anchored_prefix(&self) -> Option<&str> {
        self.pattern.strip_prefix('^')
    }

    /// Apply the rewrite once to the start of `path`.
    ///
    /// Paths that do not start with the anchored prefix are returned as-is.
    /// The result always starts with `/`.
    pub fn apply(&self, path: &str) -> String {
        let rewritten = match self.anchored_prefix().and_then(|p| path.strip_prefix(p)) {
            Some(rest) => format!("{}{}", self.replacement, rest),
            None => path.to_string(),
        };

        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{}", rewritten)
        }
    }
}
