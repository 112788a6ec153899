//! One Euler step of the four-variable dynamics engine (spec §4.2).

use rand::{Rng, SeedableRng};
use sentinel_domain::config::{IDynamicsMode, ParameterProfileConfig};
use sentinel_domain::error::{Error, Result};
use sentinel_domain::types::Verdict;

use crate::state::DynamicsState;

/// Everything a single `process_update` call needs out of one dynamics
/// step, beyond the bare next state.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub state: DynamicsState,
    /// `C(V, Theta)`, the smooth coherence function evaluated at the
    /// *pre-step* void pressure (spec §4.2). Distinct from the
    /// cross-update fingerprint coherence in `sentinel_dynamics::fingerprint`.
    pub dynamics_coherence: f64,
    /// Mean-squared ethical-drift magnitude, `||delta_eta||^2 / dim`.
    pub drift_mean_sq: f64,
    pub phi_objective: f64,
    pub verdict: Verdict,
}

/// Mean-squared magnitude of the drift vector. Empty drift contributes
/// zero, not a division-by-zero.
fn drift_mean_sq(drift: &[f64]) -> f64 {
    if drift.is_empty() {
        return 0.0;
    }
    drift.iter().map(|d| d * d).sum::<f64>() / drift.len() as f64
}

/// The smooth dynamics coherence `C(V, Theta) = 0.5 * c_max * (1 +
/// tanh(theta_c1 * V))` (spec §4.2).
fn dynamics_coherence(v: f64, profile: &ParameterProfileConfig) -> f64 {
    0.5 * profile.c_max * (1.0 + (profile.theta_c1 * v).tanh())
}

fn g_i(i: f64, profile: &ParameterProfileConfig) -> f64 {
    match profile.i_dynamics_mode {
        IDynamicsMode::Linear => profile.gamma_i * i,
        IDynamicsMode::Logistic => profile.gamma_i * i * (1.0 - i),
    }
}

/// Sample `sigma * sqrt(dt) * Z`, `Z ~ N(0, 1)`, via Box-Muller, seeded
/// deterministically so the step is reproducible for a fixed seed (spec
/// §8, "determinism (pure core)").
fn stochastic_term(sigma: f64, dt: f64, seed: u64) -> f64 {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    sigma * dt.sqrt() * z
}

/// Advance `state` by one Euler step of size `profile.dt`.
///
/// `lambda1`/`lambda2` are the governor-tuned live gains (not the profile's
/// seed values — callers read those from the agent's stored control
/// state). `complexity` is clipped to `[0, 1]`. `noise_seed` is only
/// consulted when `profile.noise.stochastic` is set; omit it (`None`) for
/// a purely deterministic run.
pub fn step(
    state: DynamicsState,
    drift: &[f64],
    lambda1: f64,
    lambda2: f64,
    complexity: f64,
    profile: &ParameterProfileConfig,
    noise_seed: Option<u64>,
) -> Result<StepOutcome> {
    let complexity = complexity.clamp(0.0, 1.0);
    let msq = drift_mean_sq(drift);
    let c = dynamics_coherence(state.v, profile);

    let d_e = profile.alpha * (state.i - state.e) - profile.beta_e * state.e * state.s
        + profile.gamma_e * state.e * msq;
    let d_i = -profile.k * state.s + profile.beta_i * state.i * c - g_i(state.i, profile);
    let noise = if profile.noise.stochastic {
        stochastic_term(profile.noise.sigma, profile.dt, noise_seed.unwrap_or(0))
    } else {
        0.0
    };
    let d_s = -profile.mu * state.s + lambda1 * msq - lambda2 * c
        + profile.beta_complex * complexity
        + noise;
    let d_v = profile.kappa * (state.e - state.i) - profile.delta * state.v;

    if ![d_e, d_i, d_s, d_v].iter().all(|d| d.is_finite()) {
        return Err(Error::DynamicsInstability(
            "non-finite derivative in Euler step".into(),
        ));
    }

    let raw = DynamicsState {
        e: state.e + profile.dt * d_e,
        i: state.i + profile.dt * d_i,
        s: state.s + profile.dt * d_s,
        v: state.v + profile.dt * d_v,
    };
    if !raw.is_finite() {
        return Err(Error::DynamicsInstability(
            "non-finite state after Euler step".into(),
        ));
    }

    let next = raw.clipped(&profile.clip);

    let phi_objective = profile.weights.engagement * next.e
        - profile.weights.internal_state * (1.0 - next.i)
        - profile.weights.entropy * next.s
        - profile.weights.void_pressure * next.v.abs()
        - profile.weights.drift * msq;

    let verdict = if phi_objective >= profile.tau_high {
        Verdict::Proceed
    } else {
        Verdict::Pause
    };

    Ok(StepOutcome {
        state: next,
        dynamics_coherence: c,
        drift_mean_sq: msq,
        phi_objective,
        verdict,
    })
}
