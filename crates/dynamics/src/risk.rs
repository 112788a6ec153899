//! Risk estimator and adaptive void threshold (spec §2/5, §4.5).

use std::collections::VecDeque;

use sentinel_domain::config::RiskConfig;
use serde::{Deserialize, Serialize};

/// Combine coherence, entropy, the void flag, and void pressure into a
/// scalar risk in `[0, 1]` (spec §4.5). `coherence` is `None` on an
/// agent's first update, when the fingerprint has no predecessor to
/// compare against — its risk component is then a neutral constant rather
/// than zero or one.
pub fn compute_risk(coherence: Option<f64>, s: f64, void_active: bool, v: f64, cfg: &RiskConfig) -> f64 {
    let incoherence = match coherence {
        Some(c) => 1.0 - c,
        None => cfg.neutral_coherence_component,
    };
    let raw = cfg.w_incoherence * incoherence
        + cfg.w_entropy * (s / cfg.s_max)
        + cfg.w_void * if void_active { 1.0 } else { 0.0 }
        + cfg.w_void_pressure * (v.abs() / cfg.v_max);
    raw.clamp(0.0, 1.0)
}

/// The adaptive void threshold: `mean(V_recent) + 2*std(V_recent)`,
/// recomputed every `void_threshold_recompute_every` updates, floored at
/// `void_threshold_floor` (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoidThreshold {
    value: f64,
    history: VecDeque<f64>,
    updates_since_recompute: usize,
}

impl VoidThreshold {
    pub fn new(cfg: &RiskConfig) -> Self {
        Self {
            value: cfg.void_threshold_floor,
            history: VecDeque::new(),
            updates_since_recompute: 0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Record the latest `|V|` sample and recompute the threshold on
    /// schedule. Returns the threshold in effect (the stale one if this
    /// update didn't land on a recompute boundary).
    pub fn observe(&mut self, v: f64, cfg: &RiskConfig) -> f64 {
        self.history.push_back(v);
        while self.history.len() > cfg.void_threshold_window {
            self.history.pop_front();
        }
        self.updates_since_recompute += 1;

        if self.updates_since_recompute >= cfg.void_threshold_recompute_every
            && !self.history.is_empty()
        {
            let n = self.history.len() as f64;
            let mean = self.history.iter().sum::<f64>() / n;
            let variance = self.history.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            self.value = (mean + 2.0 * std).max(cfg.void_threshold_floor);
            self.updates_since_recompute = 0;
        }
        self.value
    }

    /// Whether `v` exceeds the current threshold (`void_active`, spec
    /// §4.5).
    pub fn is_void(&self, v: f64) -> bool {
        v.abs() > self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_is_bounded() {
        let cfg = RiskConfig::default();
        let r = compute_risk(Some(0.0), 10.0, true, 100.0, &cfg);
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn perfect_coherence_zero_entropy_no_void_is_low_risk() {
        let cfg = RiskConfig::default();
        let r = compute_risk(Some(1.0), 0.0, false, 0.0, &cfg);
        assert!(r < 0.01);
    }

    #[test]
    fn unavailable_coherence_uses_neutral_component() {
        let cfg = RiskConfig::default();
        let r = compute_risk(None, 0.0, false, 0.0, &cfg);
        assert!((r - cfg.w_incoherence * cfg.neutral_coherence_component).abs() < 1e-9);
    }

    #[test]
    fn threshold_never_drops_below_floor() {
        let cfg = RiskConfig::default();
        let mut vt = VoidThreshold::new(&cfg);
        for _ in 0..cfg.void_threshold_recompute_every {
            vt.observe(0.0, &cfg);
        }
        assert!(vt.value() >= cfg.void_threshold_floor);
    }

    #[test]
    fn large_v_spike_marks_void_active() {
        let cfg = RiskConfig::default();
        let vt = VoidThreshold::new(&cfg);
        assert!(vt.is_void(10.0));
    }
}
