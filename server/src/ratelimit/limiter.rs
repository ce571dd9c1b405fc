//! Core throttle service using Redis.
//!
//! Two record kinds back the state machine: a per-(client, path) attempt
//! counter living one window, and a per-client block record holding the
//! absolute unblock timestamp. Leaving the blocked state has no code path;
//! it happens when the block record's TTL expires.

use std::sync::Arc;

use chrono::Utc;
use fred::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::ratelimit::{
    block_started_message, still_blocked_message, Outcome, RateLimitConfig, RateLimitError,
};

/// Redis-backed abusive-request throttle.
#[derive(Clone)]
pub struct RateLimiter {
    redis: Client,
    config: Arc<RateLimitConfig>,
}

impl RateLimiter {
    /// Creates a new throttle instance.
    pub fn new(redis: Client, config: RateLimitConfig) -> Self {
        Self {
            redis,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration for this throttle.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Evaluates one request from `client_id` against `route_path`.
    ///
    /// Counting is per (client, path); an active block applies to the client
    /// across all paths. Every Redis failure is treated as "no record found"
    /// so the gate can never take down the request pipeline.
    #[tracing::instrument(skip(self))]
    pub async fn check(&self, client_id: &str, route_path: &str) -> Outcome {
        if !self.config.enabled {
            return Outcome::Proceed;
        }
        if self.config.allowlist.contains(client_id) {
            debug!(client = %client_id, "Client in allowlist, bypassing throttle");
            return Outcome::Proceed;
        }

        if let Some(remaining) = self.block_remaining(client_id).await {
            debug!(client = %client_id, remaining, "Client is blocked");
            return Outcome::Throttled {
                retry_after: remaining,
                message: still_blocked_message(remaining),
            };
        }

        let attempt_key = self.attempt_key(client_id, route_path);
        let prior = self.read_count(&attempt_key).await;

        if prior >= u64::from(self.config.max_attempts) {
            self.enter_block(client_id, &attempt_key).await;
            warn!(
                client = %client_id,
                path = %route_path,
                attempts = prior,
                block_secs = self.config.block_secs,
                "Client blocked after repeated attempts"
            );
            return Outcome::Throttled {
                retry_after: self.config.block_secs,
                message: block_started_message(self.config.block_secs),
            };
        }

        self.record_attempt(&attempt_key, prior + 1).await;
        Outcome::Proceed
    }

    /// Removes the client's block and, when a path is given, the matching
    /// attempt counter. Operator escape hatch; idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn clear(
        &self,
        client_id: &str,
        route_path: Option<&str>,
    ) -> Result<(), RateLimitError> {
        self.redis
            .del::<i64, _>(&self.block_key(client_id))
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to clear block record");
                RateLimitError::RedisUnavailable
            })?;

        if let Some(path) = route_path {
            self.redis
                .del::<i64, _>(&self.attempt_key(client_id, path))
                .await
                .map_err(|e| {
                    warn!(error = %e, "Failed to clear attempt counter");
                    RateLimitError::RedisUnavailable
                })?;
        }

        debug!(client = %client_id, "Cleared throttle state");
        Ok(())
    }

    /// Seconds until an active block lifts, or `None` when unblocked.
    async fn block_remaining(&self, client_id: &str) -> Option<u64> {
        let key = self.block_key(client_id);
        let raw: Option<String> = match self.redis.get(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Block lookup failed, treating client as unblocked");
                None
            }
        };
        let raw = raw?;

        let now = Utc::now().timestamp();
        match raw.parse::<i64>() {
            Ok(unblock_at) if unblock_at > now => Some((unblock_at - now) as u64),
            // Value expired but the key outlived it by a beat; the TTL
            // reaper will collect it.
            Ok(_) => None,
            Err(_) => {
                warn!(client = %client_id, "Unreadable block record, falling back to key TTL");
                let ttl: i64 = self.redis.ttl(&key).await.ok()?;
                (ttl > 0).then_some(ttl as u64)
            }
        }
    }

    /// Prior attempts recorded for this (client, path) window.
    async fn read_count(&self, attempt_key: &str) -> u64 {
        let raw: Option<String> = match self.redis.get(attempt_key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Counter read failed, treating as zero attempts");
                None
            }
        };
        raw.and_then(|raw| raw.parse().ok()).unwrap_or(0)
    }

    /// Writes the incremented counter and restarts its window.
    ///
    /// Read-modify-write by design: two racing requests may both observe the
    /// same prior count and slip past the threshold together. The threshold
    /// is a soft ceiling and must not grow a lock around it.
    async fn record_attempt(&self, attempt_key: &str, count: u64) {
        let result: Result<(), Error> = self
            .redis
            .set(
                attempt_key,
                count as i64,
                Some(Expiration::EX(self.config.window_secs as i64)),
                None,
                false,
            )
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Counter write failed, attempt not recorded");
        }
    }

    /// Creates the block record and retires the attempt counter so the
    /// window starts clean once the block expires.
    async fn enter_block(&self, client_id: &str, attempt_key: &str) {
        let unblock_at = Utc::now().timestamp() + self.config.block_secs as i64;

        let result: Result<(), Error> = self
            .redis
            .set(
                &self.block_key(client_id),
                unblock_at,
                Some(Expiration::EX(self.config.block_secs as i64)),
                None,
                false,
            )
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Block write failed, client not blocked");
        }

        if let Err(e) = self.redis.del::<i64, _>(attempt_key).await {
            warn!(error = %e, "Failed to reset attempt counter on block entry");
        }
    }

    /// Attempt counters key on the (client, path) pair.
    fn attempt_key(&self, client_id: &str, route_path: &str) -> String {
        format!(
            "{}:attempts:{}",
            self.config.key_prefix,
            record_hash(&format!("{client_id}{route_path}"))
        )
    }

    /// Blocks key on the client alone, covering every path.
    fn block_key(&self, client_id: &str) -> String {
        format!("{}:block:{}", self.config.key_prefix, record_hash(client_id))
    }
}

fn record_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
