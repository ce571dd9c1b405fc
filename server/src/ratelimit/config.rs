//! Rate limiting configuration.

use std::collections::HashSet;

/// Configuration for the abusive-request throttle.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether throttling is enabled
    pub enabled: bool,
    /// Prefix for Redis keys (e.g., "warden:rl")
    pub key_prefix: String,
    /// Whether to trust X-Forwarded-For headers
    pub trust_proxy: bool,
    /// Client identifiers that bypass throttling
    pub allowlist: HashSet<String>,
    /// Attempts tolerated per (client, path) inside one window
    pub max_attempts: u32,
    /// Attempt window duration in seconds
    pub window_secs: u64,
    /// Block duration in seconds once the threshold is crossed
    pub block_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: "warden:rl".to_string(),
            trust_proxy: false,
            allowlist: HashSet::new(),
            max_attempts: 10,
            window_secs: 300,
            block_secs: 600,
        }
    }
}

impl RateLimitConfig {
    /// Creates configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RATE_LIMIT_ENABLED`: Enable/disable throttling (default: true)
    /// - `RATE_LIMIT_PREFIX`: Redis key prefix (default: "warden:rl")
    /// - `RATE_LIMIT_TRUST_PROXY`: Trust X-Forwarded-For headers (default: false)
    /// - `RATE_LIMIT_ALLOWLIST`: Comma-separated client allowlist
    /// - `RATE_LIMIT_LIMITS`: Limits as "max_attempts,window_secs,block_secs"
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RATE_LIMIT_ENABLED") {
            config.enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_PREFIX") {
            config.key_prefix = val;
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_TRUST_PROXY") {
            config.trust_proxy = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_ALLOWLIST") {
            config.allowlist = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_LIMITS") {
            if let Some((max_attempts, window_secs, block_secs)) = parse_limits(&val) {
                config.max_attempts = max_attempts;
                config.window_secs = window_secs;
                config.block_secs = block_secs;
            }
        }

        config
    }
}

/// Parses limits from "max_attempts,window_secs,block_secs" format.
fn parse_limits(val: &str) -> Option<(u32, u64, u64)> {
    let parts: Vec<&str> = val.split(',').collect();
    if parts.len() == 3 {
        let max_attempts = parts[0].trim().parse().ok()?;
        let window_secs = parts[1].trim().parse().ok()?;
        let block_secs = parts[2].trim().parse().ok()?;
        Some((max_attempts, window_secs, block_secs))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.key_prefix, "warden:rl");
        assert!(!config.trust_proxy);
        assert!(config.allowlist.is_empty());
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.window_secs, 300);
        assert_eq!(config.block_secs, 600);
    }

    #[test]
    fn test_parse_limits() {
        assert_eq!(parse_limits("10,300,600"), Some((10, 300, 600)));

        // With whitespace
        assert_eq!(parse_limits(" 5 , 60 , 120 "), Some((5, 60, 120)));

        // Invalid formats
        assert!(parse_limits("10,300").is_none());
        assert!(parse_limits("10,300,600,extra").is_none());
        assert!(parse_limits("abc,300,600").is_none());
    }
}
