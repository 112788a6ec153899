//! Session-to-agent binding with TTL eviction (spec §3 "Session binding",
//! §4.7).
//!
//! The transport supplies an opaque session key out-of-band; this store
//! maps it to the agent UUID it was most recently used with. A session
//! with no activity for longer than `session_ttl_secs` is evicted lazily
//! on next lookup — the next call with that key creates a fresh agent
//! unless the caller supplies credentials (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One session-key's binding to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBinding {
    pub agent_uuid: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// In-memory session cache. Spec §4.6 notes an external cache may
/// accelerate this lookup, but the authoritative record is the durable
/// agent store — this type is deliberately just a cache, never consulted
/// as a source of truth for whether an agent exists.
#[derive(Default)]
pub struct SessionStore {
    bindings: RwLock<HashMap<String, SessionBinding>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a session key to an agent, overwriting any prior binding for
    /// that key (first-writer-wins is not required here: a session key
    /// belongs to whichever agent most recently authenticated with it).
    pub fn bind(&self, session_key: &str, agent_uuid: Uuid) {
        let now = Utc::now();
        let mut bindings = self.bindings.write();
        bindings
            .entry(session_key.to_string())
            .and_modify(|b| {
                b.agent_uuid = agent_uuid;
                b.last_seen = now;
            })
            .or_insert(SessionBinding {
                agent_uuid,
                created_at: now,
                last_seen: now,
            });
    }

    /// Resolve a session key to its bound agent, evicting it first if its
    /// TTL has elapsed. Touches `last_seen` on a live hit.
    pub fn resolve(&self, session_key: &str, ttl_secs: u64) -> Option<Uuid> {
        let now = Utc::now();
        let mut bindings = self.bindings.write();
        let expired = bindings
            .get(session_key)
            .map(|b| (now - b.last_seen).num_seconds() as u64 > ttl_secs)
            .unwrap_or(false);
        if expired {
            bindings.remove(session_key);
            return None;
        }
        if let Some(b) = bindings.get_mut(session_key) {
            b.last_seen = now;
            Some(b.agent_uuid)
        } else {
            None
        }
    }

    pub fn unbind(&self, session_key: &str) {
        self.bindings.write().remove(session_key);
    }

    /// Sweep every binding whose TTL has elapsed. Intended to be called
    /// periodically by the server's housekeeping loop, not on the request
    /// path (which evicts lazily via `resolve`).
    pub fn evict_expired(&self, ttl_secs: u64) -> usize {
        let now = Utc::now();
        let mut bindings = self.bindings.write();
        let before = bindings.len();
        bindings.retain(|_, b| (now - b.last_seen).num_seconds() as u64 <= ttl_secs);
        before - bindings.len()
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_resolve() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.bind("sess-1", id);
        assert_eq!(store.resolve("sess-1", 3600), Some(id));
    }

    #[test]
    fn unknown_session_resolves_to_none() {
        let store = SessionStore::new();
        assert_eq!(store.resolve("nope", 3600), None);
    }

    #[test]
    fn rebinding_overwrites() {
        let store = SessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.bind("sess-1", a);
        store.bind("sess-1", b);
        assert_eq!(store.resolve("sess-1", 3600), Some(b));
    }

    #[test]
    fn expired_binding_resolves_to_none_and_is_evicted() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.bind("sess-1", id);
        assert_eq!(store.resolve("sess-1", 0), None);
        assert!(store.is_empty());
    }

    #[test]
    fn unbind_removes_entry() {
        let store = SessionStore::new();
        store.bind("sess-1", Uuid::new_v4());
        store.unbind("sess-1");
        assert!(store.is_empty());
    }
}
