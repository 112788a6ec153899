//! Adaptive PI governor: tunes `lambda1` from observed void-event
//! frequency (spec §2/4, §4.4). Operates on the slow per-accepted-update
//! timescale, as opposed to the dynamics engine's per-step `dt`.

use std::collections::VecDeque;

use sentinel_domain::config::{GovernorConfig, ParameterProfileConfig};
use serde::{Deserialize, Serialize};

/// Per-agent governor state: the live `lambda1`, the PI integrator, the
/// recent void-event history, and a quiet-streak counter for the slow
/// decay toward `lambda1_base`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorState {
    pub lambda1: f64,
    pub pi_integral: f64,
    void_history: VecDeque<bool>,
    updates_since_void: usize,
}

impl GovernorState {
    pub fn new(profile: &ParameterProfileConfig) -> Self {
        Self {
            lambda1: profile.lambda1_base,
            pi_integral: 0.0,
            void_history: VecDeque::new(),
            updates_since_void: 0,
        }
    }

    fn measured_void_frequency(&self) -> f64 {
        if self.void_history.is_empty() {
            return 0.0;
        }
        self.void_history.iter().filter(|v| **v).count() as f64 / self.void_history.len() as f64
    }

    /// Record one update's void-active flag and return the new `lambda1`.
    pub fn update(&mut self, void_active: bool, profile: &ParameterProfileConfig) -> f64 {
        let cfg: &GovernorConfig = &profile.governor;

        self.void_history.push_back(void_active);
        while self.void_history.len() > cfg.void_frequency_window {
            self.void_history.pop_front();
        }

        let measured = self.measured_void_frequency();
        let error = cfg.target_void_frequency - measured;

        self.pi_integral = (self.pi_integral + cfg.k_i * error * profile.dt)
            .clamp(-cfg.integral_max, cfg.integral_max);

        let pi_controlled =
            (profile.lambda1_base + cfg.k_p * error + self.pi_integral)
                .clamp(profile.lambda1_min, profile.lambda1_max);

        if void_active {
            self.updates_since_void = 0;
        } else {
            self.updates_since_void += 1;
        }

        let lambda1 = if self.updates_since_void >= cfg.decay_after_quiet_updates {
            pi_controlled + cfg.decay_rate * (profile.lambda1_base - pi_controlled)
        } else {
            pi_controlled
        };
        let lambda1 = lambda1.clamp(profile.lambda1_min, profile.lambda1_max);

        self.lambda1 = lambda1;
        lambda1
    }

    pub fn void_frequency(&self) -> f64 {
        self.measured_void_frequency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lambda1_starts_at_base() {
        let profile = ParameterProfileConfig::default();
        let gov = GovernorState::new(&profile);
        assert_eq!(gov.lambda1, profile.lambda1_base);
    }

    #[test]
    fn sustained_void_events_lower_lambda1_toward_min() {
        // error = target_void_frequency - measured; a saturated void window
        // drives measured -> 1.0, so error is strongly negative and
        // lambda1 is pushed down to lambda1_min, not up.
        let profile = ParameterProfileConfig::default();
        let mut gov = GovernorState::new(&profile);
        let mut last = gov.lambda1;
        for _ in 0..60 {
            last = gov.update(true, &profile);
        }
        assert!(last < profile.lambda1_base);
        assert!(last >= profile.lambda1_min);
    }

    #[test]
    fn quiet_period_recovers_toward_base() {
        let profile = ParameterProfileConfig::default();
        let mut gov = GovernorState::new(&profile);
        for _ in 0..60 {
            gov.update(true, &profile);
        }
        let suppressed = gov.lambda1;
        for _ in 0..100 {
            gov.update(false, &profile);
        }
        let recovered = gov.lambda1;
        assert!(recovered > suppressed);
        assert!(recovered <= profile.lambda1_max);
    }

    #[test]
    fn lambda1_never_leaves_bounds() {
        let profile = ParameterProfileConfig::default();
        let mut gov = GovernorState::new(&profile);
        for i in 0..500 {
            let lambda1 = gov.update(i % 3 == 0, &profile);
            assert!(lambda1 >= profile.lambda1_min && lambda1 <= profile.lambda1_max);
        }
    }
}
