//! `DialecticCollaborator`: the LLM-assisted dialectic abstraction (spec
//! §4.10). "The core only specifies the prompt shape (thesis content in,
//! structured antithesis/synthesis JSON out with fields `root_cause,
//! concerns, proposed_conditions, agrees`)" — everything past that shape
//! is the collaborator implementation's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sentinel_domain::error::Result;

/// The paused agent's thesis, as submitted to the dialectic session.
#[derive(Debug, Clone)]
pub struct ThesisInput<'a> {
    pub reasoning: &'a str,
    pub proposed_conditions: &'a [String],
    pub root_cause: Option<&'a str>,
}

/// Structured antithesis/synthesis output (spec §4.10's literal field list).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorOutput {
    pub root_cause: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub proposed_conditions: Vec<String>,
    pub agrees: Option<bool>,
}

/// Abstraction over an external model used to stand in for a peer reviewer
/// when no healthy agent is available for dialectic review.
///
/// Invoked twice per session: once to produce an antithesis, once to
/// synthesize given both the thesis and the antithesis (spec §4.10). The
/// same convergence and hard-limits safety checks that govern a two-agent
/// session apply unchanged to the result.
#[async_trait]
pub trait DialecticCollaborator: Send + Sync {
    async fn antithesis(&self, thesis: ThesisInput<'_>) -> Result<CollaboratorOutput>;

    async fn synthesis(
        &self,
        thesis: ThesisInput<'_>,
        antithesis: &CollaboratorOutput,
    ) -> Result<CollaboratorOutput>;
}
