//! The RPC boundary's request/response envelope.
//!
//! The transport (HTTP, stdio, SSE — out of scope for this core) delivers a
//! named operation with a map of arguments and a session identifier. Rather
//! than pass that map straight into handler code, every operation gets a
//! typed request variant here; an unknown field or a field of the wrong
//! shape is rejected by `serde` before any handler runs. The dispatch table
//! keyed on [`OperationName`] lives in `sentinel-governance`.

use serde::{Deserialize, Serialize};

/// The name of an operation, as carried by the transport. Used as the
/// dispatch table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationName {
    Onboard,
    Identity,
    ProcessUpdate,
    GetMetrics,
    GetHistory,
    DirectResumeIfSafe,
    RequestDialecticReview,
    SubmitThesis,
    SubmitAntithesis,
    SubmitSynthesis,
    StoreDiscovery,
    SearchDiscoveries,
    LeaveNote,
    UpdateDiscoveryStatus,
    ListAgents,
    Archive,
    Delete,
    UpdateMetadata,
    HealthCheck,
}

/// Caller identity as resolved from the transport's session key plus any
/// explicit credentials in the request body. Every operation handler
/// receives one of these, built before the handler's own arguments are
/// interpreted (spec §4.8 step 1–2).
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    pub session_key: Option<String>,
    pub agent_id: Option<String>,
    pub api_key: Option<String>,
    /// Set by the transport's admin guard after checking the configured
    /// bearer token (spec §9's "Admin gating" decision). Never settable
    /// from request arguments themselves.
    pub is_admin: bool,
}

/// A tagged-variant request type, one arm per [`OperationName`]. Unknown
/// fields are rejected by `#[serde(deny_unknown_fields)]` on each inner
/// struct.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "snake_case")]
pub enum Request {
    Onboard(OnboardArgs),
    Identity(IdentityArgs),
    ProcessUpdate(ProcessUpdateArgs),
    GetMetrics(GetMetricsArgs),
    GetHistory(GetHistoryArgs),
    DirectResumeIfSafe(DirectResumeArgs),
    RequestDialecticReview(RequestDialecticArgs),
    SubmitThesis(SubmitMessageArgs),
    SubmitAntithesis(SubmitMessageArgs),
    SubmitSynthesis(SubmitMessageArgs),
    StoreDiscovery(StoreDiscoveryArgs),
    SearchDiscoveries(SearchDiscoveriesArgs),
    LeaveNote(LeaveNoteArgs),
    UpdateDiscoveryStatus(UpdateDiscoveryStatusArgs),
    ListAgents(ListAgentsArgs),
    Archive(AgentIdArgs),
    Delete(AgentIdArgs),
    UpdateMetadata(UpdateMetadataArgs),
    HealthCheck(HealthCheckArgs),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OnboardArgs {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub model_hint: Option<String>,
    /// Caller-requested `agent_id`. Optional — when absent one is generated
    /// from the new UUID. When present it is subject to the same format and
    /// reserved-name validation as any other `agent_id` (spec §4.7).
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityArgs {}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessUpdateArgs {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub response_text: String,
    pub complexity: f64,
    #[serde(default)]
    pub parameters: Vec<f64>,
    #[serde(default)]
    pub ethical_drift: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GetMetricsArgs {
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GetHistoryArgs {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
    #[serde(default)]
    pub format: HistoryFormat,
}

fn default_history_limit() -> usize {
    100
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFormat {
    #[default]
    Summary,
    Full,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectResumeArgs {
    pub agent_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDialecticArgs {
    pub agent_id: String,
    pub reason: String,
    #[serde(default)]
    pub reviewer_mode: ReviewerMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewerMode {
    #[default]
    Auto,
    SelfAssisted,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitMessageArgs {
    pub session_id: String,
    pub author: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub proposed_conditions: Vec<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub observed_metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub agrees: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreDiscoveryArgs {
    pub author: String,
    pub summary: String,
    pub details: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub severity: String,
    #[serde(default = "default_discovery_type")]
    pub discovery_type: String,
}

fn default_discovery_type() -> String {
    "observation".into()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchDiscoveriesArgs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_search_limit() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveNoteArgs {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDiscoveryStatusArgs {
    pub discovery_id: String,
    pub new_status: String,
    pub updater: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListAgentsArgs {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentIdArgs {
    pub agent_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMetadataArgs {
    pub agent_id: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthCheckArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{"operation":"onboard","arguments":{"display_name":"x","bogus":1}}"#;
        let parsed: std::result::Result<Request, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn round_trips_process_update() {
        let req = Request::ProcessUpdate(ProcessUpdateArgs {
            agent_id: Some("a1".into()),
            api_key: None,
            response_text: "hello".into(),
            complexity: 0.3,
            parameters: vec![],
            ethical_drift: vec![],
        });
        let json = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        match back {
            Request::ProcessUpdate(args) => assert_eq!(args.response_text, "hello"),
            _ => panic!("wrong variant"),
        }
    }
}
