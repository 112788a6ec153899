//! Shared value types referenced by more than one sentinel crate.
//!
//! Kept here (rather than duplicated in `sentinel-store` and
//! `sentinel-dialectic`) so the status/severity vocabulary used across the
//! agent lifecycle, the dialectic protocol, and the knowledge graph cannot
//! drift out of sync.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an agent's metadata record (spec §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Paused,
    WaitingInput,
    Archived,
    Deleted,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Paused => "paused",
            AgentStatus::WaitingInput => "waiting_input",
            AgentStatus::Archived => "archived",
            AgentStatus::Deleted => "deleted",
        }
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(AgentStatus::Active),
            "paused" => Ok(AgentStatus::Paused),
            "waiting_input" => Ok(AgentStatus::WaitingInput),
            "archived" => Ok(AgentStatus::Archived),
            "deleted" => Ok(AgentStatus::Deleted),
            other => Err(format!("unknown agent status: {other}")),
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The per-update verdict emitted by the dynamics engine (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Proceed,
    Pause,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Proceed => "proceed",
            Verdict::Pause => "pause",
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "proceed" => Ok(Verdict::Proceed),
            "pause" => Ok(Verdict::Pause),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// A discovery's review status in the knowledge graph (spec §3, §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Open,
    Resolved,
    Archived,
}

impl DiscoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryStatus::Open => "open",
            DiscoveryStatus::Resolved => "resolved",
            DiscoveryStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for DiscoveryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(DiscoveryStatus::Open),
            "resolved" => Ok(DiscoveryStatus::Resolved),
            "archived" => Ok(DiscoveryStatus::Archived),
            other => Err(format!("unknown discovery status: {other}")),
        }
    }
}

/// Severity of a knowledge-graph discovery, ordered low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// The dialectic protocol's phase (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialecticPhase {
    Thesis,
    Antithesis,
    Synthesis,
    Resolved,
    Escalated,
    Failed,
}

impl DialecticPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialecticPhase::Thesis => "thesis",
            DialecticPhase::Antithesis => "antithesis",
            DialecticPhase::Synthesis => "synthesis",
            DialecticPhase::Resolved => "resolved",
            DialecticPhase::Escalated => "escalated",
            DialecticPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DialecticPhase::Resolved | DialecticPhase::Escalated | DialecticPhase::Failed
        )
    }
}

/// The dialectic protocol's final resolution action (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    Resume,
    Block,
    Escalate,
}

impl ResolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionAction::Resume => "resume",
            ResolutionAction::Block => "block",
            ResolutionAction::Escalate => "escalate",
        }
    }
}
