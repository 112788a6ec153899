//! Identity, authentication, and session binding (spec §2/7, §4.7).
//!
//! Three concerns live here: validating the human-facing `agent_id`
//! format and reserved-name blocklist, generating and verifying API keys,
//! and mapping a transport-supplied session key to an agent UUID with TTL
//! eviction. None of this crate touches durable storage directly —
//! `sentinel-store` owns the agent record itself; this crate only knows
//! how to check a key and resolve a session.

pub mod api_key;
pub mod session;
pub mod validate;

pub use api_key::{generate_api_key, verify_api_key, ApiKeyHash};
pub use session::{SessionBinding, SessionStore};
pub use validate::validate_agent_id;
