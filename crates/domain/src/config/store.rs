use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings for the durable agent/dialectic/discovery store and the
/// per-agent advisory lock (spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of past updates kept in each agent's in-memory history ring
    /// buffer (older entries still persist to disk, just aren't kept hot).
    #[serde(default = "d_history_capacity")]
    pub history_capacity: usize,
    /// Base delay for the per-agent lock's exponential backoff, in seconds.
    /// Attempt k waits `lock_backoff_base_secs * 2^k`.
    #[serde(default = "d_lock_backoff_base_secs")]
    pub lock_backoff_base_secs: f64,
    /// Maximum number of backoff retries before the lock attempt fails with
    /// `Error::Busy`.
    #[serde(default = "d_lock_max_retries")]
    pub lock_max_retries: u32,
    /// A lock held longer than this with no liveness heartbeat from its
    /// owner is considered abandoned and may be reclaimed.
    #[serde(default = "d_lock_stale_after_secs")]
    pub lock_stale_after_secs: u64,
    /// Circuit-breaker thresholds (spec §4.6).
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// An `active` agent with no update for this many days becomes
    /// eligible for automatic archival by lifecycle policy (spec §4.6).
    #[serde(default = "d_inactivity_archive_days")]
    pub inactivity_archive_days: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: d_history_capacity(),
            lock_backoff_base_secs: d_lock_backoff_base_secs(),
            lock_max_retries: d_lock_max_retries(),
            lock_stale_after_secs: d_lock_stale_after_secs(),
            circuit_breaker: CircuitBreakerConfig::default(),
            inactivity_archive_days: d_inactivity_archive_days(),
        }
    }
}

/// Thresholds that trip the circuit breaker and gate safe auto-resume
/// (spec §4.6, §8 "Safety" testable property).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Pause when `risk >= tau_pause`.
    #[serde(default = "d_tau_pause")]
    pub tau_pause: f64,
    /// Pause when `coherence <= tau_coh_min` (once coherence is available).
    #[serde(default = "d_tau_coh_min")]
    pub tau_coh_min: f64,
    /// Additional margin `direct_resume_if_safe` requires beyond the raw
    /// pause thresholds ("slightly looser bounds" per spec §4.6). Zero by
    /// default so the safe-resume check matches the §8 testable property
    /// exactly (`risk < tau_pause`, `coherence >= tau_coh_min`); raise it to
    /// require a larger safety margin before auto-resume.
    #[serde(default)]
    pub resume_margin: f64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            tau_pause: d_tau_pause(),
            tau_coh_min: d_tau_coh_min(),
            resume_margin: 0.0,
        }
    }
}

fn d_history_capacity() -> usize {
    1000
}
fn d_lock_backoff_base_secs() -> f64 {
    0.2
}
fn d_lock_max_retries() -> u32 {
    5
}
fn d_lock_stale_after_secs() -> u64 {
    30
}
fn d_inactivity_archive_days() -> u64 {
    30
}
fn d_tau_pause() -> f64 {
    0.65
}
fn d_tau_coh_min() -> f64 {
    0.35
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.history_capacity, 1000);
        assert_eq!(cfg.lock_max_retries, 5);
    }
}
