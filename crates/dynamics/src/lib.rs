//! The pure-computation core of the governance monitor: the four-variable
//! dynamics engine, the parameter fingerprint and cross-update coherence,
//! the adaptive PI governor, and the risk estimator (spec §4.2–§4.5).
//!
//! Nothing in this crate performs I/O or holds shared mutable state across
//! agents — every function takes its state explicitly and returns the next
//! state. `sentinel-store` owns persistence and per-agent locking;
//! `sentinel-governance` wires this crate's pieces together per update.

pub mod engine;
pub mod fingerprint;
pub mod governor;
pub mod risk;
pub mod state;

pub use engine::{step, StepOutcome};
pub use state::DynamicsState;
