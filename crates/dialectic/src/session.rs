//! The thesis/antithesis/synthesis session state machine (spec §4.9).

use chrono::{DateTime, Utc};
use sentinel_domain::config::DialecticConfig;
use sentinel_domain::error::{Error, Result};
use sentinel_domain::trace::TraceEvent;
use sentinel_domain::types::{DialecticPhase, ResolutionAction};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::convergence::{conditions_match, root_cause_matches};
use crate::safety;
use crate::signature;

/// Which of the three message types was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Thesis,
    Antithesis,
    Synthesis,
}

impl MessageKind {
    fn as_str(self) -> &'static str {
        match self {
            MessageKind::Thesis => "thesis",
            MessageKind::Antithesis => "antithesis",
            MessageKind::Synthesis => "synthesis",
        }
    }
}

/// One append-only message in a dialectic session (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticMessage {
    pub ordinal: u32,
    pub kind: MessageKind,
    pub author_uuid: Uuid,
    pub reasoning: String,
    pub proposed_conditions: Vec<String>,
    pub root_cause: Option<String>,
    pub observed_metrics: serde_json::Value,
    pub agrees: Option<bool>,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

/// The session's terminal (or in-progress) resolution (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub action: ResolutionAction,
    pub conditions: Vec<String>,
    pub reason: String,
}

/// The full mutable session record, co-owned by the system and the two
/// participants (spec §3 ownership note: "state transitions are
/// system-gated").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticSession {
    pub session_id: Uuid,
    pub paused_agent_id: Uuid,
    pub reviewer_agent_id: Uuid,
    pub phase: DialecticPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub messages: Vec<DialecticMessage>,
    pub resolution: Option<Resolution>,
    synthesis_count_paused: u32,
    synthesis_count_reviewer: u32,
}

/// What `submit` returns to the RPC caller (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub phase: DialecticPhase,
    pub converged: bool,
    pub rounds: u32,
}

impl DialecticSession {
    pub fn new(session_id: Uuid, paused_agent_id: Uuid, reviewer_agent_id: Uuid) -> Self {
        TraceEvent::DialecticSessionCreated {
            session_id: session_id.to_string(),
            paused_agent_id: paused_agent_id.to_string(),
            reviewer_agent_id: reviewer_agent_id.to_string(),
        }
        .emit();
        let now = Utc::now();
        Self {
            session_id,
            paused_agent_id,
            reviewer_agent_id,
            phase: DialecticPhase::Thesis,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            messages: Vec::new(),
            resolution: None,
            synthesis_count_paused: 0,
            synthesis_count_reviewer: 0,
        }
    }

    /// Reconstruct a session loaded from durable storage. The synthesis
    /// round counters are recomputed from the message history rather than
    /// stored directly, so the store's schema doesn't need to carry them.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        session_id: Uuid,
        paused_agent_id: Uuid,
        reviewer_agent_id: Uuid,
        phase: DialecticPhase,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        resolution: Option<Resolution>,
        messages: Vec<DialecticMessage>,
    ) -> Self {
        let synthesis_count_paused = messages
            .iter()
            .filter(|m| m.kind == MessageKind::Synthesis && m.author_uuid == paused_agent_id)
            .count() as u32;
        let synthesis_count_reviewer = messages
            .iter()
            .filter(|m| m.kind == MessageKind::Synthesis && m.author_uuid == reviewer_agent_id)
            .count() as u32;
        Self {
            session_id,
            paused_agent_id,
            reviewer_agent_id,
            phase,
            created_at,
            updated_at,
            resolved_at: if phase.is_terminal() { Some(updated_at) } else { None },
            messages,
            resolution,
            synthesis_count_paused,
            synthesis_count_reviewer,
        }
    }

    fn rounds(&self) -> u32 {
        self.synthesis_count_paused.min(self.synthesis_count_reviewer)
    }

    fn latest_synthesis_by(&self, author_uuid: Uuid) -> Option<&DialecticMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Synthesis && m.author_uuid == author_uuid)
    }

    /// Submit one message; drives the phase transitions, convergence
    /// detection, round cap, and (on convergence) the hard-limits safety
    /// check (spec §4.9).
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        kind: MessageKind,
        author_uuid: Uuid,
        reasoning: String,
        proposed_conditions: Vec<String>,
        root_cause: Option<String>,
        observed_metrics: serde_json::Value,
        agrees: Option<bool>,
        secret: &[u8],
        cfg: &DialecticConfig,
    ) -> Result<SubmitOutcome> {
        if self.phase.is_terminal() {
            return Err(Error::WrongPhase {
                expected: "an open session".into(),
                actual: self.phase.as_str().into(),
            });
        }

        self.authorize(kind, author_uuid)?;

        let now = Utc::now();
        let content = serde_json::json!({
            "reasoning": reasoning,
            "proposed_conditions": proposed_conditions,
            "root_cause": root_cause,
            "observed_metrics": observed_metrics,
            "agrees": agrees,
        })
        .to_string();
        let timestamp_rfc3339 = now.to_rfc3339();
        let sig = signature::sign(secret, author_uuid, self.session_id, &content, &timestamp_rfc3339);

        let message = DialecticMessage {
            ordinal: self.messages.len() as u32,
            kind,
            author_uuid,
            reasoning,
            proposed_conditions,
            root_cause,
            observed_metrics,
            agrees,
            signature: sig,
            timestamp: now,
        };
        self.messages.push(message);
        self.updated_at = now;

        match kind {
            MessageKind::Thesis => {
                self.transition_phase(DialecticPhase::Antithesis);
                Ok(SubmitOutcome {
                    phase: self.phase,
                    converged: false,
                    rounds: 0,
                })
            }
            MessageKind::Antithesis => {
                self.transition_phase(DialecticPhase::Synthesis);
                Ok(SubmitOutcome {
                    phase: self.phase,
                    converged: false,
                    rounds: 0,
                })
            }
            MessageKind::Synthesis => self.advance_synthesis(author_uuid, cfg),
        }
    }

    fn transition_phase(&mut self, to: DialecticPhase) {
        TraceEvent::DialecticPhaseTransition {
            session_id: self.session_id.to_string(),
            from_phase: self.phase.as_str().into(),
            to_phase: to.as_str().into(),
        }
        .emit();
        self.phase = to;
    }

    fn authorize(&self, kind: MessageKind, author_uuid: Uuid) -> Result<()> {
        match kind {
            MessageKind::Thesis => {
                if self.phase != DialecticPhase::Thesis {
                    return Err(Error::WrongPhase {
                        expected: "thesis".into(),
                        actual: self.phase.as_str().into(),
                    });
                }
                if author_uuid != self.paused_agent_id {
                    return Err(Error::AuthRequired(
                        "only the paused agent may submit a thesis".into(),
                    ));
                }
            }
            MessageKind::Antithesis => {
                if self.phase != DialecticPhase::Antithesis {
                    return Err(Error::WrongPhase {
                        expected: "antithesis".into(),
                        actual: self.phase.as_str().into(),
                    });
                }
                if author_uuid != self.reviewer_agent_id {
                    return Err(Error::AuthRequired(
                        "only the reviewer may submit an antithesis".into(),
                    ));
                }
            }
            MessageKind::Synthesis => {
                if self.phase != DialecticPhase::Synthesis {
                    return Err(Error::WrongPhase {
                        expected: "synthesis".into(),
                        actual: self.phase.as_str().into(),
                    });
                }
                if author_uuid != self.paused_agent_id && author_uuid != self.reviewer_agent_id {
                    return Err(Error::AuthRequired(
                        "only a session participant may submit synthesis".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn advance_synthesis(&mut self, author_uuid: Uuid, cfg: &DialecticConfig) -> Result<SubmitOutcome> {
        if author_uuid == self.paused_agent_id {
            self.synthesis_count_paused += 1;
        } else {
            self.synthesis_count_reviewer += 1;
        }
        let rounds = self.rounds();

        let paused_latest = self.latest_synthesis_by(self.paused_agent_id).cloned();
        let reviewer_latest = self.latest_synthesis_by(self.reviewer_agent_id).cloned();

        let converged = match (&paused_latest, &reviewer_latest) {
            (Some(a), Some(b)) => {
                a.agrees == Some(true)
                    && b.agrees == Some(true)
                    && root_cause_matches(a.root_cause.as_deref(), b.root_cause.as_deref())
                    && conditions_match(&a.proposed_conditions, &b.proposed_conditions)
            }
            _ => false,
        };

        if converged {
            let a = paused_latest.unwrap();
            let b = reviewer_latest.unwrap();
            let mut conditions = a.proposed_conditions.clone();
            for c in &b.proposed_conditions {
                if !conditions.iter().any(|existing| existing.eq_ignore_ascii_case(c)) {
                    conditions.push(c.clone());
                }
            }
            self.resolve_converged(conditions, cfg);
            return Ok(SubmitOutcome {
                phase: self.phase,
                converged: true,
                rounds,
            });
        }

        if rounds >= cfg.max_rounds {
            self.transition_phase(DialecticPhase::Escalated);
            self.resolved_at = Some(Utc::now());
            self.resolution = Some(Resolution {
                action: ResolutionAction::Escalate,
                conditions: Vec::new(),
                reason: format!("no agreement reached within {} rounds", cfg.max_rounds),
            });
            TraceEvent::DialecticResolved {
                session_id: self.session_id.to_string(),
                action: ResolutionAction::Escalate.as_str().into(),
            }
            .emit();
            return Err(Error::MaxRoundsExceeded);
        }

        Ok(SubmitOutcome {
            phase: self.phase,
            converged: false,
            rounds,
        })
    }

    /// Single-party synthesis for the LLM-assisted variant (spec §4.10):
    /// there is no second participant to exchange synthesis rounds with, so
    /// the external collaborator's one `agrees` verdict stands in for both
    /// parties' agreement. Skips the dual-author round counter in
    /// `advance_synthesis` entirely, since that counter can never advance
    /// past zero when both roles are the same agent.
    pub fn submit_llm_synthesis(
        &mut self,
        reasoning: String,
        proposed_conditions: Vec<String>,
        root_cause: Option<String>,
        agrees: bool,
        secret: &[u8],
        cfg: &DialecticConfig,
    ) -> Result<SubmitOutcome> {
        if self.phase != DialecticPhase::Synthesis {
            return Err(Error::WrongPhase {
                expected: "synthesis".into(),
                actual: self.phase.as_str().into(),
            });
        }

        let now = Utc::now();
        let content = serde_json::json!({
            "reasoning": reasoning,
            "proposed_conditions": proposed_conditions,
            "root_cause": root_cause,
            "agrees": agrees,
        })
        .to_string();
        let timestamp_rfc3339 = now.to_rfc3339();
        let sig = signature::sign(
            secret,
            self.paused_agent_id,
            self.session_id,
            &content,
            &timestamp_rfc3339,
        );
        self.messages.push(DialecticMessage {
            ordinal: self.messages.len() as u32,
            kind: MessageKind::Synthesis,
            author_uuid: self.paused_agent_id,
            reasoning,
            proposed_conditions: proposed_conditions.clone(),
            root_cause,
            observed_metrics: serde_json::json!({}),
            agrees: Some(agrees),
            signature: sig,
            timestamp: now,
        });
        self.updated_at = now;

        if agrees {
            self.resolve_converged(proposed_conditions, cfg);
            Ok(SubmitOutcome {
                phase: self.phase,
                converged: true,
                rounds: 1,
            })
        } else {
            self.transition_phase(DialecticPhase::Escalated);
            self.resolved_at = Some(now);
            self.resolution = Some(Resolution {
                action: ResolutionAction::Escalate,
                conditions: Vec::new(),
                reason: "LLM-assisted collaborator did not agree with its own synthesis".into(),
            });
            TraceEvent::DialecticResolved {
                session_id: self.session_id.to_string(),
                action: ResolutionAction::Escalate.as_str().into(),
            }
            .emit();
            Err(Error::MaxRoundsExceeded)
        }
    }

    fn resolve_converged(&mut self, conditions: Vec<String>, cfg: &DialecticConfig) {
        self.resolved_at = Some(Utc::now());
        let (action, reason) = match safety::check_all(&conditions, cfg) {
            Ok(()) => (
                ResolutionAction::Resume,
                "converged and passed the hard-limits safety check".to_string(),
            ),
            Err(violation) => (
                ResolutionAction::Block,
                format!("unsafe condition `{}`: {}", violation.condition, violation.reason),
            ),
        };
        self.transition_phase(DialecticPhase::Resolved);
        self.resolution = Some(Resolution {
            action,
            conditions,
            reason,
        });
        TraceEvent::DialecticResolved {
            session_id: self.session_id.to_string(),
            action: action.as_str().into(),
        }
        .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (DialecticSession, Uuid, Uuid) {
        let paused = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        (DialecticSession::new(Uuid::new_v4(), paused, reviewer), paused, reviewer)
    }

    fn secret() -> &'static [u8] {
        b"test-secret"
    }

    #[test]
    fn thesis_then_antithesis_advances_phases() {
        let (mut s, paused, reviewer) = session();
        let cfg = DialecticConfig::default();
        let out = s
            .submit(
                MessageKind::Thesis,
                paused,
                "external spike".into(),
                vec!["lower complexity cap to 0.4".into()],
                Some("external spike".into()),
                serde_json::json!({}),
                None,
                secret(),
                &cfg,
            )
            .unwrap();
        assert_eq!(out.phase, DialecticPhase::Antithesis);

        let out = s
            .submit(
                MessageKind::Antithesis,
                reviewer,
                "monitor for cascade".into(),
                vec![],
                None,
                serde_json::json!({}),
                None,
                secret(),
                &cfg,
            )
            .unwrap();
        assert_eq!(out.phase, DialecticPhase::Synthesis);
    }

    #[test]
    fn wrong_author_for_thesis_is_rejected() {
        let (mut s, _paused, reviewer) = session();
        let cfg = DialecticConfig::default();
        let result = s.submit(
            MessageKind::Thesis,
            reviewer,
            "x".into(),
            vec![],
            None,
            serde_json::json!({}),
            None,
            secret(),
            &cfg,
        );
        assert!(matches!(result, Err(Error::AuthRequired(_))));
    }

    fn advance_to_synthesis(s: &mut DialecticSession, paused: Uuid, reviewer: Uuid, cfg: &DialecticConfig) {
        s.submit(
            MessageKind::Thesis,
            paused,
            "t".into(),
            vec![],
            None,
            serde_json::json!({}),
            None,
            secret(),
            cfg,
        )
        .unwrap();
        s.submit(
            MessageKind::Antithesis,
            reviewer,
            "a".into(),
            vec![],
            None,
            serde_json::json!({}),
            None,
            secret(),
            cfg,
        )
        .unwrap();
    }

    #[test]
    fn matching_synthesis_converges_and_resolves_resume() {
        let (mut s, paused, reviewer) = session();
        let cfg = DialecticConfig::default();
        advance_to_synthesis(&mut s, paused, reviewer, &cfg);

        s.submit(
            MessageKind::Synthesis,
            paused,
            "agree".into(),
            vec!["lower complexity cap to 0.4".into()],
            Some("external spike".into()),
            serde_json::json!({}),
            Some(true),
            secret(),
            &cfg,
        )
        .unwrap();
        let out = s
            .submit(
                MessageKind::Synthesis,
                reviewer,
                "agree".into(),
                vec!["lower complexity cap to 0.4".into()],
                Some("external spike".into()),
                serde_json::json!({}),
                Some(true),
                secret(),
                &cfg,
            )
            .unwrap();

        assert!(out.converged);
        assert_eq!(out.phase, DialecticPhase::Resolved);
        assert_eq!(s.resolution.as_ref().unwrap().action, ResolutionAction::Resume);
    }

    #[test]
    fn unsafe_converged_condition_resolves_block() {
        let (mut s, paused, reviewer) = session();
        let cfg = DialecticConfig::default();
        advance_to_synthesis(&mut s, paused, reviewer, &cfg);

        for author in [paused, reviewer] {
            s.submit(
                MessageKind::Synthesis,
                author,
                "agree".into(),
                vec!["disable the audit log".into()],
                Some("x".into()),
                serde_json::json!({}),
                Some(true),
                secret(),
                &cfg,
            )
            .unwrap();
        }

        assert_eq!(s.phase, DialecticPhase::Resolved);
        assert_eq!(s.resolution.as_ref().unwrap().action, ResolutionAction::Block);
    }

    #[test]
    fn repeated_non_convergence_escalates_at_round_cap() {
        let (mut s, paused, reviewer) = session();
        let mut cfg = DialecticConfig::default();
        cfg.max_rounds = 2;
        advance_to_synthesis(&mut s, paused, reviewer, &cfg);

        for round in 0..cfg.max_rounds {
            for author in [paused, reviewer] {
                let result = s.submit(
                    MessageKind::Synthesis,
                    author,
                    "disagree".into(),
                    vec![format!("condition-{round}")],
                    Some("x".into()),
                    serde_json::json!({}),
                    Some(false),
                    secret(),
                    &cfg,
                );
                if round + 1 == cfg.max_rounds && author == reviewer {
                    assert!(matches!(result, Err(Error::MaxRoundsExceeded)));
                } else {
                    assert!(result.is_ok());
                }
            }
        }
        assert_eq!(s.phase, DialecticPhase::Escalated);
    }

    #[test]
    fn terminal_session_rejects_further_submissions() {
        let (mut s, paused, reviewer) = session();
        let cfg = DialecticConfig::default();
        advance_to_synthesis(&mut s, paused, reviewer, &cfg);
        for author in [paused, reviewer] {
            s.submit(
                MessageKind::Synthesis,
                author,
                "agree".into(),
                vec!["lower complexity cap to 0.4".into()],
                Some("x".into()),
                serde_json::json!({}),
                Some(true),
                secret(),
                &cfg,
            )
            .unwrap();
        }
        let result = s.submit(
            MessageKind::Synthesis,
            paused,
            "late".into(),
            vec![],
            None,
            serde_json::json!({}),
            Some(true),
            secret(),
            &cfg,
        );
        assert!(matches!(result, Err(Error::WrongPhase { .. })));
    }
}
