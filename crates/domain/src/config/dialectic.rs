use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialectic recovery protocol
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings for the thesis/antithesis/synthesis review protocol that a
/// paused agent goes through to resume when auto-resume is unsafe
/// (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticConfig {
    /// Thesis/antithesis/synthesis round cap before the session escalates.
    #[serde(default = "d_max_rounds")]
    pub max_rounds: u32,
    /// Number of most-recently-active eligible agents considered as
    /// candidate reviewers (the reviewer pool window, spec §4.9).
    #[serde(default = "d_reviewer_pool_window")]
    pub reviewer_pool_window: usize,
    /// Regex patterns that, if matched in a submitted message's reasoning
    /// or proposed conditions, make the resolution action "escalate"
    /// regardless of what the session otherwise agreed.
    #[serde(default = "d_forbidden_patterns")]
    pub forbidden_patterns: Vec<String>,
    /// A synthesis whose self-reported risk score is above this threshold
    /// is rejected outright as an unsafe resolution, even if both parties
    /// agree to it.
    #[serde(default = "d_hard_limit_threshold")]
    pub hard_limit_threshold: f64,
    /// How long a session may sit with no message submitted before it is
    /// considered abandoned and auto-escalated.
    #[serde(default = "d_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,
}

impl Default for DialecticConfig {
    fn default() -> Self {
        Self {
            max_rounds: d_max_rounds(),
            reviewer_pool_window: d_reviewer_pool_window(),
            forbidden_patterns: d_forbidden_patterns(),
            hard_limit_threshold: d_hard_limit_threshold(),
            session_idle_timeout_secs: d_session_idle_timeout_secs(),
        }
    }
}

fn d_max_rounds() -> u32 {
    5
}
fn d_reviewer_pool_window() -> usize {
    10
}
fn d_forbidden_patterns() -> Vec<String> {
    vec![
        r"(?i)disable".into(),
        r"(?i)bypass".into(),
        r"(?i)ignore safety".into(),
        r"(?i)remove monitoring".into(),
        r"(?i)skip governance".into(),
        r"(?i)override limits".into(),
    ]
}
fn d_hard_limit_threshold() -> f64 {
    0.90
}
fn d_session_idle_timeout_secs() -> u64 {
    900
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_all_compile() {
        let cfg = DialecticConfig::default();
        for p in &cfg.forbidden_patterns {
            assert!(regex::Regex::new(p).is_ok(), "pattern {p} failed to compile");
        }
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: DialecticConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.max_rounds, 5);
        assert!((cfg.hard_limit_threshold - 0.90).abs() < f64::EPSILON);
    }
}
