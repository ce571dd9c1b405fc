//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::Result;
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Redis connection URL
    pub redis_url: String,

    /// Route receiving every authorization redirect
    pub login_path: String,

    /// Session cookie name
    pub session_cookie: String,

    /// Prefix for session keys in Redis
    pub session_key_prefix: String,

    /// Session lifetime in seconds (default: 7200 = 2 hours)
    pub session_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into()),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".into()),
            session_cookie: env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| "warden_session".into()),
            session_key_prefix: env::var("SESSION_PREFIX")
                .unwrap_or_else(|_| "warden:sess".into()),
            session_ttl_secs: env::var("SESSION_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7200), // 2 hours
        })
    }
}
