use serde::Serialize;

/// Structured trace events emitted across all sentinel crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    AgentOnboarded {
        uuid: String,
        agent_id: String,
    },
    UpdateProcessed {
        uuid: String,
        verdict: String,
        risk: f64,
        coherence: Option<f64>,
        duration_ms: u64,
    },
    CircuitBreakerTripped {
        uuid: String,
        risk: f64,
        coherence: Option<f64>,
        void_active: bool,
    },
    AgentResumed {
        uuid: String,
        via: String,
    },
    GovernorAdjusted {
        uuid: String,
        lambda1: f64,
        void_frequency: f64,
        pi_integral: f64,
    },
    LockContended {
        uuid: String,
        attempt: u32,
    },
    LockReclaimed {
        uuid: String,
        previous_owner: String,
    },
    StorageRetry {
        operation: String,
        attempt: u32,
    },
    AuditAuthFailure {
        agent_id: Option<String>,
        reason: String,
    },
    DialecticSessionCreated {
        session_id: String,
        paused_agent_id: String,
        reviewer_agent_id: String,
    },
    DialecticPhaseTransition {
        session_id: String,
        from_phase: String,
        to_phase: String,
    },
    DialecticResolved {
        session_id: String,
        action: String,
    },
    KnowledgeDiscoveryStored {
        discovery_id: String,
        author_uuid: String,
    },
    KnowledgeGraphCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sentinel_event");
    }
}
