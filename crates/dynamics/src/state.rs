//! The four-variable dynamics state, `(E, I, S, V)` (spec §3, GLOSSARY).

use sentinel_domain::config::ClipRanges;
use serde::{Deserialize, Serialize};

/// Productive engagement (`E`), internal-state integrity (`I`), entropy
/// (`S`), and accumulated void pressure (`V`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicsState {
    pub e: f64,
    pub i: f64,
    pub s: f64,
    pub v: f64,
}

impl DynamicsState {
    /// The dynamics engine's initial state for a freshly onboarded agent:
    /// mid-scale engagement and internal state, zero entropy and void
    /// pressure.
    pub fn initial() -> Self {
        Self {
            e: 0.5,
            i: 0.5,
            s: 0.0,
            v: 0.0,
        }
    }

    /// Whether every scalar is finite. A non-finite value anywhere means
    /// the step that produced it must be rejected (spec §4.2,
    /// `DynamicsInstability`).
    pub fn is_finite(&self) -> bool {
        self.e.is_finite() && self.i.is_finite() && self.s.is_finite() && self.v.is_finite()
    }

    /// Clip each scalar to the configured bounds (spec §4.1/§4.2, applied
    /// after every step).
    pub fn clipped(self, clip: &ClipRanges) -> Self {
        Self {
            e: self.e.clamp(clip.engagement.0, clip.engagement.1),
            i: self.i.clamp(clip.internal_state.0, clip.internal_state.1),
            s: self.s.clamp(clip.entropy.0, clip.entropy.1),
            v: self.v.clamp(clip.void_pressure.0, clip.void_pressure.1),
        }
    }
}
