//! The live per-agent record `S_a` (spec §3): dynamics state, governor,
//! adaptive void threshold, last fingerprint, and bounded history — the
//! mutable unit the per-agent lock protects.

use sentinel_dynamics::fingerprint::Fingerprint;
use sentinel_dynamics::governor::GovernorState;
use sentinel_dynamics::risk::VoidThreshold;
use sentinel_dynamics::DynamicsState;
use sentinel_domain::config::ParameterProfileConfig;
use serde::{Deserialize, Serialize};

use crate::history::HistoryRing;

/// Everything the governance loop reads and mutates while holding one
/// agent's lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub dynamics: DynamicsState,
    pub governor: GovernorState,
    pub void_threshold: VoidThreshold,
    pub void_active: bool,
    pub coherence: Option<f64>,
    pub risk: f64,
    pub last_fingerprint: Option<Fingerprint>,
    pub history: HistoryRing,
}

impl AgentState {
    /// The state of a freshly onboarded agent (spec §3, §4.2).
    pub fn initial(profile: &ParameterProfileConfig, history_capacity: usize) -> Self {
        Self {
            dynamics: DynamicsState::initial(),
            governor: GovernorState::new(profile),
            void_threshold: VoidThreshold::new(&profile.risk),
            void_active: false,
            coherence: None,
            risk: 0.0,
            last_fingerprint: None,
            history: HistoryRing::new(history_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_has_no_fingerprint_and_empty_history() {
        let profile = ParameterProfileConfig::default();
        let state = AgentState::initial(&profile, 1000);
        assert!(state.last_fingerprint.is_none());
        assert!(state.history.is_empty());
        assert_eq!(state.dynamics, DynamicsState::initial());
    }
}
