//! Agent metadata: the lifecycle record `M_a` (spec §3).

use chrono::{DateTime, Utc};
use sentinel_domain::types::AgentStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only lifecycle transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub at: DateTime<Utc>,
    pub from: AgentStatus,
    pub to: AgentStatus,
    pub reason: String,
}

/// The lifecycle record for one agent: identity, ownership, status, and
/// free-form bookkeeping (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub uuid: Uuid,
    pub agent_id: String,
    pub label: Option<String>,
    pub api_key_hash: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parent_uuid: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub lifecycle_events: Vec<LifecycleEvent>,
}

impl AgentMetadata {
    pub fn new(uuid: Uuid, agent_id: String, label: Option<String>, api_key_hash: String) -> Self {
        let now = Utc::now();
        Self {
            uuid,
            agent_id,
            label,
            api_key_hash,
            status: AgentStatus::Active,
            created_at: now,
            updated_at: now,
            parent_uuid: None,
            tags: Vec::new(),
            notes: Vec::new(),
            lifecycle_events: Vec::new(),
        }
    }

    /// Transition status, appending a lifecycle event (spec §4.6). The
    /// transition itself is not validated here — the store's
    /// `circuit_breaker` and governance loop decide which transitions are
    /// legal and when.
    pub fn transition(&mut self, to: AgentStatus, reason: impl Into<String>) {
        let from = self.status;
        let now = Utc::now();
        self.lifecycle_events.push(LifecycleEvent {
            at: now,
            from,
            to,
            reason: reason.into(),
        });
        self.status = to;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agent_starts_active_with_no_events() {
        let meta = AgentMetadata::new(Uuid::new_v4(), "alpha".into(), None, "hash".into());
        assert_eq!(meta.status, AgentStatus::Active);
        assert!(meta.lifecycle_events.is_empty());
    }

    #[test]
    fn transition_appends_event_and_updates_status() {
        let mut meta = AgentMetadata::new(Uuid::new_v4(), "alpha".into(), None, "hash".into());
        meta.transition(AgentStatus::Paused, "risk too high");
        assert_eq!(meta.status, AgentStatus::Paused);
        assert_eq!(meta.lifecycle_events.len(), 1);
        assert_eq!(meta.lifecycle_events[0].from, AgentStatus::Active);
        assert_eq!(meta.lifecycle_events[0].to, AgentStatus::Paused);
    }
}
