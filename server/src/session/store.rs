//! Session persistence over Redis.
//!
//! Records are plain JSON under a configurable key prefix with a sliding
//! TTL. Redis failures never surface to the request pipeline: a read error
//! yields an anonymous session and a write error is logged and dropped.

use std::sync::Arc;

use fred::prelude::*;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::session::{Session, SessionRecord};

/// Session store configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie carrying the session identifier.
    pub cookie_name: String,
    /// Prefix for Redis keys (e.g., "warden:sess").
    pub key_prefix: String,
    /// Record lifetime in seconds, refreshed on every save.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "warden_session".to_string(),
            key_prefix: "warden:sess".to_string(),
            ttl_secs: 7200,
        }
    }
}

/// Redis-backed session service.
#[derive(Clone)]
pub struct SessionStore {
    redis: Client,
    config: Arc<SessionConfig>,
}

impl SessionStore {
    pub fn new(redis: Client, config: SessionConfig) -> Self {
        Self {
            redis,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn key(&self, id: &str) -> String {
        format!("{}:{}", self.config.key_prefix, id)
    }

    /// Loads the session for a cookie value, or starts an anonymous one.
    ///
    /// Unknown, malformed, or unreadable identifiers all fall through to a
    /// fresh anonymous session.
    #[tracing::instrument(skip(self))]
    pub async fn open(&self, id: Option<&str>) -> Session {
        let Some(id) = id.filter(|id| Uuid::parse_str(id).is_ok()) else {
            return Session::anonymous();
        };

        let raw: Option<String> = match self.redis.get(&self.key(id)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Session read failed, starting anonymous session");
                None
            }
        };

        match raw {
            Some(raw) => match serde_json::from_str::<SessionRecord>(&raw) {
                Ok(record) => Session::from_record(id, record),
                Err(e) => {
                    warn!(error = %e, "Discarding undecodable session record");
                    Session::anonymous()
                }
            },
            None => Session::anonymous(),
        }
    }

    /// Persists the session and refreshes its TTL.
    #[tracing::instrument(skip_all)]
    pub async fn save(&self, session: &Session) {
        let (id, record) = session.to_record();
        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to encode session record");
                return;
            }
        };

        let result: Result<(), Error> = self
            .redis
            .set(
                &self.key(&id),
                raw,
                Some(Expiration::EX(self.config.ttl_secs as i64)),
                None,
                false,
            )
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Session write failed, state dropped for this request");
        }
    }

    /// Destroys the stored record and rotates the handle's identifier.
    ///
    /// Deletion happens immediately so the next request from the same client
    /// observes a logged-out state even if it races this one.
    #[tracing::instrument(skip_all)]
    pub async fn invalidate(&self, session: &Session) {
        let key = self.key(&session.id());
        if let Err(e) = self.redis.del::<i64, _>(&key).await {
            warn!(error = %e, "Session delete failed");
        }
        session.rotate();
        debug!("Session invalidated");
    }
}
