//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

// == Store Backend ==
/// Which idempotency store implementation to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process concurrent map with a background sweep
    Memory,
    /// Shared Redis instance
    Redis,
}

impl StoreBackend {
    /// Parses the backend name, defaulting to the in-process store for
    /// anything unrecognized.
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "redis" => StoreBackend::Redis,
            _ => StoreBackend::Memory,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds applied when a request omits `ttl_seconds`
    pub default_ttl: u64,
    /// Background sweep interval in seconds (in-process backend only)
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Which store backend to construct
    pub backend: StoreBackend,
    /// Redis host (shared backend only)
    pub redis_host: String,
    /// Redis port (shared backend only)
    pub redis_port: u16,
    /// Per-call Redis timeout in milliseconds
    pub redis_timeout_ms: u64,
    /// Optional path to the JSON API key file; unset disables auth
    pub api_key_file: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_SECONDS` - Default record TTL in seconds (default: 3600)
    /// - `SWEEP_INTERVAL_SECONDS` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `IDEMPOTENCY_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_TIMEOUT_MS` - Per-call Redis timeout (default: 2000)
    /// - `API_KEY_FILE` - Path to `{"apiKey": ...}` file (default: unset)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env::var("DEFAULT_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            sweep_interval: env::var("SWEEP_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            backend: env::var("IDEMPOTENCY_BACKEND")
                .map(|v| StoreBackend::parse(&v))
                .unwrap_or(StoreBackend::Memory),
            redis_host: env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            redis_port: env::var("REDIS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6379),
            redis_timeout_ms: env::var("REDIS_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
            api_key_file: env::var("API_KEY_FILE").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 3600,
            sweep_interval: 60,
            server_port: 8080,
            backend: StoreBackend::Memory,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_timeout_ms: 2000,
            api_key_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.sweep_interval, 60);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.redis_port, 6379);
        assert!(config.api_key_file.is_none());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(StoreBackend::parse("redis"), StoreBackend::Redis);
        assert_eq!(StoreBackend::parse("Redis"), StoreBackend::Redis);
        assert_eq!(StoreBackend::parse("memory"), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("anything-else"), StoreBackend::Memory);
    }
}
