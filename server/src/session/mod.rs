//! Redis-backed cookie sessions with one-shot flash data.
//!
//! A [`Session`] is a cheap cloneable handle placed in request extensions by
//! [`middleware::session_layer`]. Values mutate in memory during the request
//! and are persisted once at the end of the pipeline. Flash entries written
//! with [`Session::set_flash`] are visible to exactly the next request and
//! discarded afterwards.

pub mod middleware;
pub mod store;

pub use middleware::session_layer;
pub use store::{SessionConfig, SessionStore};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Persisted session payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Durable key-value data.
    pub values: Map<String, Value>,
    /// Flash data written during the producing request, readable once.
    #[serde(default)]
    pub flash: Map<String, Value>,
}

#[derive(Debug)]
struct Inner {
    id: String,
    values: Map<String, Value>,
    /// Flash written by the previous request, visible now.
    incoming_flash: Map<String, Value>,
    /// Flash written by this request, visible to the next one.
    outgoing_flash: Map<String, Value>,
    /// True for brand-new and rotated sessions; drives the Set-Cookie.
    fresh: bool,
}

/// Handle to the per-request session state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    /// Creates an empty session with a fresh identifier.
    pub fn anonymous() -> Self {
        Self::build(new_session_id(), Map::new(), Map::new(), true)
    }

    /// Rebuilds a session from its persisted record.
    pub fn from_record(id: &str, record: SessionRecord) -> Self {
        Self::build(id.to_string(), record.values, record.flash, false)
    }

    fn build(
        id: String,
        values: Map<String, Value>,
        incoming_flash: Map<String, Value>,
        fresh: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                id,
                values,
                incoming_flash,
                outgoing_flash: Map::new(),
                fresh,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    /// Whether the identifier was minted during this request.
    pub fn is_fresh(&self) -> bool {
        self.lock().fresh
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().values.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.lock().values.insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) {
        self.lock().values.remove(key);
    }

    /// Stages a flash value for the next request.
    pub fn set_flash(&self, key: &str, value: Value) {
        self.lock().outgoing_flash.insert(key.to_string(), value);
    }

    /// Reads a flash value left by the previous request.
    pub fn flash(&self, key: &str) -> Option<Value> {
        self.lock().incoming_flash.get(key).cloned()
    }

    /// Drops all state and mints a new identifier.
    ///
    /// Outgoing flash survives so an "expired" notice reaches the client's
    /// next request; everything else is gone and the next request observes a
    /// logged-out session.
    pub(crate) fn rotate(&self) {
        let mut inner = self.lock();
        inner.id = new_session_id();
        inner.values.clear();
        inner.incoming_flash.clear();
        inner.fresh = true;
    }

    /// Snapshot for persistence. Incoming flash is intentionally absent:
    /// saving is what retires one-shot data after its single visible request.
    pub(crate) fn to_record(&self) -> (String, SessionRecord) {
        let inner = self.lock();
        (
            inner.id.clone(),
            SessionRecord {
                values: inner.values.clone(),
                flash: inner.outgoing_flash.clone(),
            },
        )
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anonymous_session_is_fresh() {
        let session = Session::anonymous();
        assert!(session.is_fresh());
        assert!(session.get("logged_in").is_none());
    }

    #[test]
    fn test_values_round_trip_through_record() {
        let session = Session::anonymous();
        session.insert("role", json!("manager"));
        let (_, record) = session.to_record();

        let restored = Session::from_record("11111111-2222-4333-8444-555555555555", record);
        assert!(!restored.is_fresh());
        assert_eq!(restored.get("role"), Some(json!("manager")));
    }

    #[test]
    fn test_flash_is_visible_exactly_once() {
        let producer = Session::anonymous();
        producer.set_flash("error", json!("denied"));
        let (id, record) = producer.to_record();

        // Next request sees the flash...
        let next = Session::from_record(&id, record);
        assert_eq!(next.flash("error"), Some(json!("denied")));

        // ...but the record it persists no longer carries it.
        let (id, record) = next.to_record();
        let after = Session::from_record(&id, record);
        assert_eq!(after.flash("error"), None);
    }

    #[test]
    fn test_rotate_clears_values_and_changes_id() {
        let session = Session::anonymous();
        session.insert("logged_in", json!(true));
        session.set_flash("error", json!("expired"));
        let old_id = session.id();

        session.rotate();

        assert_ne!(session.id(), old_id);
        assert!(session.is_fresh());
        assert!(session.get("logged_in").is_none());
        // Outgoing flash survives rotation.
        let (_, record) = session.to_record();
        assert_eq!(record.flash.get("error"), Some(&json!("expired")));
    }
}
