//! Dialectic recovery protocol (spec §2/9): the thesis/antithesis/synthesis
//! session state machine, reviewer selection, the hard-limits safety
//! filter, HMAC message signing, and durable persistence.

pub mod convergence;
pub mod reviewer;
pub mod safety;
pub mod session;
pub mod signature;
pub mod store;

pub use reviewer::{select_reviewer, ReviewerCandidate};
pub use safety::{check_all as check_conditions_safe, SafetyViolation};
pub use session::{DialecticMessage, DialecticSession, MessageKind, Resolution, SubmitOutcome};
pub use store::DialecticStore;
