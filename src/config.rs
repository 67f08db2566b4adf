//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::DEFAULT_KEY_PREFIX;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for writes without explicit TTL (0 = never expire)
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Prefix prepended to every canonical cache key
    pub key_prefix: String,
    /// Minimum self-check score (percent) for a healthy report
    pub health_threshold: f64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `KEY_PREFIX` - Canonical key prefix (default: `las_`)
    /// - `HEALTH_THRESHOLD` - Passing self-check percentage (default: 80)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval).max(1),
            key_prefix: env::var("KEY_PREFIX").unwrap_or(defaults.key_prefix),
            health_threshold: env_or("HEALTH_THRESHOLD", defaults.health_threshold),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 3600,
            server_port: 3000,
            cleanup_interval: 60,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            health_threshold: 80.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.key_prefix, "las_");
        assert_eq!(config.health_threshold, 80.0);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("STYLER_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("STYLER_CACHE_TEST_GARBAGE", 7u64), 7);
        env::remove_var("STYLER_CACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_reads_value() {
        env::set_var("STYLER_CACHE_TEST_PORT", "8080");
        assert_eq!(env_or("STYLER_CACHE_TEST_PORT", 3000u16), 8080);
        env::remove_var("STYLER_CACHE_TEST_PORT");
    }
}
