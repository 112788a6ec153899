//! Typed response payloads, one per operation (spec §6's output column).
//!
//! Handlers return these directly; [`dispatch::dispatch`] wraps the chosen
//! variant into the outer [`Response`] enum that the transport serializes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use sentinel_domain::types::{AgentStatus, DialecticPhase, DiscoveryStatus, ResolutionAction, Severity, Verdict};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "result", rename_all = "snake_case")]
pub enum Response {
    Onboard(OnboardResponse),
    Identity(IdentityResponse),
    ProcessUpdate(ProcessUpdateResponse),
    GetMetrics(MetricsResponse),
    GetHistory(HistoryResponse),
    DirectResumeIfSafe(ResumeResponse),
    RequestDialecticReview(DialecticReviewResponse),
    DialecticSubmit(DialecticSubmitResponse),
    Discovery(DiscoveryResponse),
    Discoveries(Vec<DiscoveryResponse>),
    DiscoveryStatusUpdated(DiscoveryStatusResponse),
    Lifecycle(LifecycleResponse),
    AgentList(AgentListResponse),
    Health(HealthResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardResponse {
    pub uuid: Uuid,
    pub agent_id: String,
    /// One-time plaintext hint. Never recoverable once this response is
    /// gone — only the salted hash is retained.
    pub api_key: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub uuid: Uuid,
    pub agent_id: String,
    pub display_name: Option<String>,
    pub status: AgentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub e: f64,
    pub i: f64,
    pub s: f64,
    pub v: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessUpdateResponse {
    pub uuid: Uuid,
    pub state: StateSnapshot,
    pub coherence: Option<f64>,
    pub risk: f64,
    pub verdict: Verdict,
    pub status: AgentStatus,
    pub guidance: String,
    pub learning_context: Vec<String>,
    /// Only present when this call minted a new key (never on an ordinary
    /// update to an existing agent).
    pub api_key_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub uuid: Uuid,
    pub agent_id: String,
    pub status: AgentStatus,
    pub state: StateSnapshot,
    pub coherence: Option<f64>,
    pub risk: f64,
    pub lambda1: f64,
    pub void_active: bool,
    pub recent_history: Vec<HistoryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub recorded_at: DateTime<Utc>,
    pub e: f64,
    pub i: f64,
    pub s: f64,
    pub v: f64,
    pub coherence: Option<f64>,
    pub risk: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub uuid: Uuid,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub resumed: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticReviewResponse {
    pub session_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub llm_assisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticSubmitResponse {
    pub session_id: Uuid,
    pub phase: DialecticPhase,
    pub converged: bool,
    pub rounds: u32,
    pub resolution_action: Option<ResolutionAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub id: Uuid,
    pub author_uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub summary: String,
    pub details: String,
    pub kind: String,
    pub status: DiscoveryStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryStatusResponse {
    pub id: Uuid,
    pub status: DiscoveryStatus,
    pub updater_uuid: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleResponse {
    pub uuid: Uuid,
    pub agent_id: String,
    pub status: AgentStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentListResponse {
    pub agents: Vec<AgentSummary>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub uuid: Uuid,
    pub agent_id: String,
    pub label: Option<String>,
    pub status: AgentStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub uptime_secs: u64,
    pub open_dialectic_sessions: usize,
    pub kg_backend_ok: bool,
    pub extra: Value,
}
