//! Circuit breaker: trips an agent to `paused` when safety thresholds are
//! crossed, and gates `direct_resume_if_safe` (spec §4.6, §8 "Safety").

use sentinel_domain::config::CircuitBreakerConfig;

/// Whether the just-computed metrics require the circuit breaker to trip
/// (spec §4.6: `risk >= tau_pause` or `coherence <= tau_coh_min` or
/// `void_active`).
pub fn should_trip(risk: f64, coherence: Option<f64>, void_active: bool, cfg: &CircuitBreakerConfig) -> bool {
    if void_active {
        return true;
    }
    if risk >= cfg.tau_pause {
        return true;
    }
    if let Some(c) = coherence {
        if c <= cfg.tau_coh_min {
            return true;
        }
    }
    false
}

/// Whether `direct_resume_if_safe` may resume the agent: the same
/// thresholds, with `resume_margin` as extra headroom, and no active void
/// (spec §4.6, §8). Unavailable coherence (no prior fingerprint yet) is
/// treated as safe, since the risk component already substitutes a
/// neutral value for it.
pub fn is_safe_to_resume(risk: f64, coherence: Option<f64>, void_active: bool, cfg: &CircuitBreakerConfig) -> bool {
    if void_active {
        return false;
    }
    if risk >= cfg.tau_pause - cfg.resume_margin {
        return false;
    }
    if let Some(c) = coherence {
        if c <= cfg.tau_coh_min + cfg.resume_margin {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            tau_pause: 0.65,
            tau_coh_min: 0.35,
            resume_margin: 0.0,
        }
    }

    #[test]
    fn void_active_always_trips() {
        assert!(should_trip(0.0, Some(1.0), true, &cfg()));
    }

    #[test]
    fn high_risk_trips() {
        assert!(should_trip(0.70, Some(0.9), false, &cfg()));
    }

    #[test]
    fn low_coherence_trips() {
        assert!(should_trip(0.1, Some(0.2), false, &cfg()));
    }

    #[test]
    fn healthy_metrics_do_not_trip() {
        assert!(!should_trip(0.1, Some(0.9), false, &cfg()));
    }

    #[test]
    fn resume_matches_testable_property_boundaries() {
        let c = cfg();
        assert!(!is_safe_to_resume(0.65, Some(0.9), false, &c));
        assert!(!is_safe_to_resume(0.1, Some(0.35), false, &c));
        assert!(!is_safe_to_resume(0.1, Some(0.9), true, &c));
        assert!(is_safe_to_resume(0.1, Some(0.9), false, &c));
    }

    #[test]
    fn unavailable_coherence_does_not_block_resume() {
        assert!(is_safe_to_resume(0.1, None, false, &cfg()));
    }
}
