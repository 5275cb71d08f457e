//! Configuration data structures for the GitHub gateway.
//!
//! This module defines the schema for the application settings: the
//! upstream GitHub API connection, the response cache backend, and
//! logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Upstream GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the upstream GitHub API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the REST API.
    /// Default: `https://api.github.com`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Value sent in the `User-Agent` header. GitHub rejects requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// TCP connect timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Which storage backend the response cache uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// No cache stage at all.
    None,
    /// Process-local map.
    Memory,
    /// Shared Redis instance.
    Redis,
}

/// How cache keys relate to the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyScope {
    /// Key is method + URL only; responses are shared between tokens.
    #[default]
    Shared,
    /// Key additionally carries a digest of the token.
    PerToken,
}

/// Settings for the response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Storage backend.
    /// Default: `memory`
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    /// Connection URL for the Redis backend.
    /// Default: `redis://127.0.0.1:6379`
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Prefix prepended to every key written to Redis.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Expiry applied by the Redis backend. `0` disables expiry.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Whether cached responses are shared across tokens.
    #[serde(default)]
    pub key_scope: CacheKeyScope,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            ttl_seconds: default_ttl(),
            key_scope: CacheKeyScope::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    format!("github-gateway/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Memory
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "github-gateway:".to_string()
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
