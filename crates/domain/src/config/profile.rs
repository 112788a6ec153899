use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dynamics engine parameter profile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Coefficients and integration settings for the four-variable ODE dynamics
/// engine, the adaptive governor, and the risk estimator (spec §4.1, §4.4,
/// §4.5). One profile applies to every agent; there is deliberately no
/// per-agent override in v1 — tune globally, redeploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterProfileConfig {
    /// Engagement's relaxation toward the internal-state variable, `dE/dt`
    /// term `alpha * (I - E)`.
    #[serde(default = "d_alpha")]
    pub alpha: f64,
    /// Entropy-coupled decay of engagement, `dE/dt` term `-beta_e * E * S`.
    #[serde(default = "d_beta_e")]
    pub beta_e: f64,
    /// Coherence-coupled growth of internal state, `dI/dt` term
    /// `beta_i * I * C`.
    #[serde(default = "d_beta_i")]
    pub beta_i: f64,
    /// Entropy forcing from internal state, `dI/dt` term `-k * S`.
    #[serde(default = "d_k")]
    pub k: f64,
    /// Drift-driven engagement growth, `dE/dt` term
    /// `gamma_e * E * mean_sq(drift)`.
    #[serde(default = "d_gamma_e")]
    pub gamma_e: f64,
    /// Internal-state decay coefficient, `g_I(I)` (linear: `gamma_i * I`;
    /// logistic: `gamma_i * I * (1 - I)`, selected by `i_dynamics_mode`).
    /// The spec's documented default differs by mode (0.169 linear, 0.25
    /// logistic); this field holds whichever applies to the configured
    /// mode, so switching modes without retuning this value is a config
    /// mistake the operator must catch, not one the engine silently papers
    /// over.
    #[serde(default = "d_gamma_i")]
    pub gamma_i: f64,
    /// Entropy's own decay rate, `dS/dt` term `-mu * S`.
    #[serde(default = "d_mu")]
    pub mu: f64,
    /// Void-pressure forcing from the E-I gap, `dV/dt` term
    /// `kappa * (E - I)`.
    #[serde(default = "d_kappa")]
    pub kappa: f64,
    /// Void-pressure's own decay rate, `dV/dt` term `-delta * V`.
    #[serde(default = "d_delta")]
    pub delta: f64,
    /// Complexity forcing into entropy, `dS/dt` term
    /// `beta_complex * complexity`. Not individually named in the source
    /// spec's default list; chosen here as the weight that keeps a
    /// complexity=1.0 update from dominating the drift term at default
    /// `lambda1_base` (see DESIGN.md).
    #[serde(default = "d_beta_complex")]
    pub beta_complex: f64,
    /// Governor-tunable drift-to-entropy gain seed; the governor (spec
    /// §4.4) adapts the live value between `lambda1_min` and `lambda1_max`,
    /// this is only the starting point.
    #[serde(default = "d_lambda1_base")]
    pub lambda1_base: f64,
    pub lambda1_min: f64,
    pub lambda1_max: f64,
    /// Coherence-to-entropy damping, `dS/dt` term `-lambda2_base * C`.
    #[serde(default = "d_lambda2_base")]
    pub lambda2_base: f64,
    /// Ceiling of the coherence function `C(V, Theta)`.
    #[serde(default = "d_c_max")]
    pub c_max: f64,
    /// Steepness of the coherence function's `tanh`, `Theta.C1` in
    /// `C = 0.5 * c_max * (1 + tanh(theta_c1 * V))`.
    #[serde(default = "d_theta_c1")]
    pub theta_c1: f64,
    /// Objective threshold: verdict is `proceed` iff `phi_objective >=
    /// tau_high`, else `pause` (spec §4.2 two-tier verdict). Slightly
    /// negative by default: a freshly onboarded agent's first update sits
    /// a hair below zero (E=0.5, I relaxing down, tiny entropy uptick),
    /// and that baseline state must proceed, not pause (see DESIGN.md).
    #[serde(default = "d_tau_high")]
    pub tau_high: f64,
    /// Euler integration step, in simulated seconds per update.
    #[serde(default = "d_dt")]
    pub dt: f64,
    /// Which branch of the internal-state dynamics to run.
    #[serde(default)]
    pub i_dynamics_mode: IDynamicsMode,
    /// Clip ranges applied to each state variable after every step, so a
    /// single bad update cannot send the engine to +/- infinity.
    #[serde(default)]
    pub clip: ClipRanges,
    /// Weights for the `phi_objective` linear combination (spec §4.2).
    #[serde(default)]
    pub weights: ObjectiveWeights,
    /// Stochastic forcing on `dS/dt` (spec §4.2: "noise is optional").
    #[serde(default)]
    pub noise: NoiseConfig,
    /// Adaptive PI governor settings (spec §4.4).
    #[serde(default)]
    pub governor: GovernorConfig,
    /// Risk estimator and adaptive void threshold settings (spec §4.5).
    #[serde(default)]
    pub risk: RiskConfig,
}

impl Default for ParameterProfileConfig {
    fn default() -> Self {
        Self {
            alpha: d_alpha(),
            beta_e: d_beta_e(),
            beta_i: d_beta_i(),
            k: d_k(),
            gamma_e: d_gamma_e(),
            gamma_i: d_gamma_i(),
            mu: d_mu(),
            kappa: d_kappa(),
            delta: d_delta(),
            beta_complex: d_beta_complex(),
            lambda1_base: d_lambda1_base(),
            lambda1_min: d_lambda1_min(),
            lambda1_max: d_lambda1_max(),
            lambda2_base: d_lambda2_base(),
            c_max: d_c_max(),
            theta_c1: d_theta_c1(),
            tau_high: d_tau_high(),
            dt: d_dt(),
            i_dynamics_mode: IDynamicsMode::default(),
            clip: ClipRanges::default(),
            weights: ObjectiveWeights::default(),
            noise: NoiseConfig::default(),
            governor: GovernorConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

/// Which internal-state update rule the engine runs for `dI/dt`.
///
/// Decided in DESIGN.md: default to `Linear` to avoid the bistability the
/// spec warns the logistic branch can produce; `Logistic` remains available
/// for deployments that want saturating (bounded-growth) behavior without a
/// code change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IDynamicsMode {
    /// `g_I(I) = gamma_i * I`.
    #[default]
    Linear,
    /// `g_I(I) = gamma_i * I * (1 - I)`, saturating as `I` approaches 1.
    Logistic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipRanges {
    #[serde(default = "d_e_range")]
    pub engagement: (f64, f64),
    #[serde(default = "d_i_range")]
    pub internal_state: (f64, f64),
    #[serde(default = "d_s_range")]
    pub entropy: (f64, f64),
    #[serde(default = "d_v_range")]
    pub void_pressure: (f64, f64),
}

impl Default for ClipRanges {
    fn default() -> Self {
        Self {
            engagement: d_e_range(),
            internal_state: d_i_range(),
            entropy: d_s_range(),
            void_pressure: d_v_range(),
        }
    }
}

/// Weights for `phi_objective = wE*E - wI*(1-I) - wS*S - wV*|V| -
/// wEta*mean_sq(drift)` (spec §4.2). These are documented defaults, not a
/// normalized distribution — they need not sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    #[serde(default = "d_w_engagement")]
    pub engagement: f64,
    #[serde(default = "d_w_internal_state")]
    pub internal_state: f64,
    #[serde(default = "d_w_entropy")]
    pub entropy: f64,
    #[serde(default = "d_w_void")]
    pub void_pressure: f64,
    #[serde(default = "d_w_eta")]
    pub drift: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            engagement: d_w_engagement(),
            internal_state: d_w_internal_state(),
            entropy: d_w_entropy(),
            void_pressure: d_w_void(),
            drift: d_w_eta(),
        }
    }
}

/// Stochastic forcing added to `dS/dt`. Disabled by default: spec §4.2
/// treats noise as instantaneous drift rate unless stochastic mode is on,
/// in which case it scales as `sigma * sqrt(dt) * Z`, `Z ~ N(0,1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(default)]
    pub stochastic: bool,
    #[serde(default = "d_noise_sigma")]
    pub sigma: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            stochastic: false,
            sigma: d_noise_sigma(),
        }
    }
}

/// PI controller settings for the adaptive governor (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Target void-event frequency (fraction of recent updates with
    /// `void_active=true`).
    #[serde(default = "d_target_void_frequency")]
    pub target_void_frequency: f64,
    /// Window (in updates) over which void frequency is averaged.
    #[serde(default = "d_void_frequency_window")]
    pub void_frequency_window: usize,
    #[serde(default = "d_k_p")]
    pub k_p: f64,
    #[serde(default = "d_k_i")]
    pub k_i: f64,
    /// Anti-windup clamp on the integral term.
    #[serde(default = "d_integral_max")]
    pub integral_max: f64,
    /// Decay rate toward `lambda1_base` applied when no void events have
    /// occurred for `decay_after_quiet_updates` updates.
    #[serde(default = "d_decay_rate")]
    pub decay_rate: f64,
    #[serde(default = "d_decay_after_quiet_updates")]
    pub decay_after_quiet_updates: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            target_void_frequency: d_target_void_frequency(),
            void_frequency_window: d_void_frequency_window(),
            k_p: d_k_p(),
            k_i: d_k_i(),
            integral_max: d_integral_max(),
            decay_rate: d_decay_rate(),
            decay_after_quiet_updates: d_decay_after_quiet_updates(),
        }
    }
}

/// Risk-estimator weights and adaptive void-threshold settings (spec
/// §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// `risk = clamp(w1*(1-coherence) + w2*S/s_max + w3*void_active +
    /// w4*|V|/v_max, 0, 1)`.
    #[serde(default = "d_risk_w1")]
    pub w_incoherence: f64,
    #[serde(default = "d_risk_w2")]
    pub w_entropy: f64,
    #[serde(default = "d_risk_w3")]
    pub w_void: f64,
    #[serde(default = "d_risk_w4")]
    pub w_void_pressure: f64,
    /// Neutral value substituted for the incoherence component when
    /// cross-update coherence is unavailable (first update for an agent).
    /// Tuned so a first update with no other risk signal lands in the
    /// "moderate, not yet confident" risk band rather than near zero (see
    /// DESIGN.md).
    #[serde(default = "d_neutral_coherence_component")]
    pub neutral_coherence_component: f64,
    /// Normalizer for the entropy term, `S_max`.
    #[serde(default = "d_s_max")]
    pub s_max: f64,
    /// Normalizer for the void-pressure term, `V_max`.
    #[serde(default = "d_v_max")]
    pub v_max: f64,
    /// How many updates between recomputing the adaptive void threshold.
    #[serde(default = "d_void_threshold_recompute_every")]
    pub void_threshold_recompute_every: usize,
    /// Floor below which the adaptive void threshold never drops.
    #[serde(default = "d_void_threshold_floor")]
    pub void_threshold_floor: f64,
    /// How many recent `V` values feed the adaptive void threshold's
    /// mean/std estimate.
    #[serde(default = "d_void_threshold_window")]
    pub void_threshold_window: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            w_incoherence: d_risk_w1(),
            w_entropy: d_risk_w2(),
            w_void: d_risk_w3(),
            w_void_pressure: d_risk_w4(),
            neutral_coherence_component: d_neutral_coherence_component(),
            s_max: d_s_max(),
            v_max: d_v_max(),
            void_threshold_recompute_every: d_void_threshold_recompute_every(),
            void_threshold_floor: d_void_threshold_floor(),
            void_threshold_window: d_void_threshold_window(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_alpha() -> f64 {
    0.42
}
fn d_beta_e() -> f64 {
    0.10
}
fn d_beta_i() -> f64 {
    0.30
}
fn d_k() -> f64 {
    0.10
}
fn d_gamma_e() -> f64 {
    0.05
}
fn d_gamma_i() -> f64 {
    0.169
}
fn d_mu() -> f64 {
    0.80
}
fn d_kappa() -> f64 {
    0.30
}
fn d_delta() -> f64 {
    0.40
}
fn d_beta_complex() -> f64 {
    0.10
}
fn d_lambda1_base() -> f64 {
    0.15
}
fn d_lambda1_min() -> f64 {
    0.05
}
fn d_lambda1_max() -> f64 {
    0.20
}
fn d_lambda2_base() -> f64 {
    0.05
}
fn d_c_max() -> f64 {
    1.0
}
fn d_theta_c1() -> f64 {
    1.0
}
fn d_tau_high() -> f64 {
    -0.05
}
fn d_dt() -> f64 {
    0.1
}
fn d_e_range() -> (f64, f64) {
    (0.0, 1.0)
}
fn d_i_range() -> (f64, f64) {
    (0.0, 1.0)
}
fn d_s_range() -> (f64, f64) {
    (0.0, 2.0)
}
fn d_v_range() -> (f64, f64) {
    (-2.0, 2.0)
}
fn d_w_engagement() -> f64 {
    1.0
}
fn d_w_internal_state() -> f64 {
    1.0
}
fn d_w_entropy() -> f64 {
    1.0
}
fn d_w_void() -> f64 {
    0.5
}
fn d_w_eta() -> f64 {
    0.5
}
fn d_noise_sigma() -> f64 {
    0.05
}
fn d_target_void_frequency() -> f64 {
    0.02
}
fn d_void_frequency_window() -> usize {
    50
}
fn d_k_p() -> f64 {
    0.5
}
fn d_k_i() -> f64 {
    0.05
}
fn d_integral_max() -> f64 {
    0.10
}
fn d_decay_rate() -> f64 {
    0.01
}
fn d_decay_after_quiet_updates() -> usize {
    20
}
fn d_risk_w1() -> f64 {
    0.4
}
fn d_risk_w2() -> f64 {
    0.2
}
fn d_risk_w3() -> f64 {
    0.3
}
fn d_risk_w4() -> f64 {
    0.1
}
fn d_neutral_coherence_component() -> f64 {
    0.75
}
fn d_s_max() -> f64 {
    2.0
}
fn d_v_max() -> f64 {
    2.0
}
fn d_void_threshold_recompute_every() -> usize {
    20
}
fn d_void_threshold_floor() -> f64 {
    0.15
}
fn d_void_threshold_window() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_risk_weights_sum_to_one() {
        let r = RiskConfig::default();
        let sum = r.w_incoherence + r.w_entropy + r.w_void + r.w_void_pressure;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_lambda1_base_within_bounds() {
        let p = ParameterProfileConfig::default();
        assert!(p.lambda1_base >= p.lambda1_min && p.lambda1_base <= p.lambda1_max);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: ParameterProfileConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.i_dynamics_mode, IDynamicsMode::Linear);
        assert!((cfg.dt - 0.1).abs() < f64::EPSILON);
        assert!((cfg.alpha - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn clip_ranges_match_profile() {
        let clip = ClipRanges::default();
        assert_eq!(clip.entropy, (0.0, 2.0));
        assert_eq!(clip.void_pressure, (-2.0, 2.0));
    }
}
