//! API key generation, salted-hash storage, and constant-time
//! verification (spec §4.7).
//!
//! A key is generated once, at first creation of a given `agent_id`
//! (spec §4.7), returned to the caller as a one-time hint, and never
//! stored in plaintext — only a salted SHA-256 digest is persisted.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sentinel_domain::config::IdentityConfig;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// A salted API key digest, as persisted in `agent_state.api_key_hash`.
/// The plaintext key is never stored; only this survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyHash {
    salt_hex: String,
    digest_hex: String,
}

impl ApiKeyHash {
    fn compute(plaintext: &str, salt: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(salt).expect("HMAC accepts keys of any length");
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn as_stored(&self) -> String {
        format!("{}:{}", self.salt_hex, self.digest_hex)
    }

    pub fn from_stored(s: &str) -> Option<Self> {
        let (salt_hex, digest_hex) = s.split_once(':')?;
        Some(Self {
            salt_hex: salt_hex.to_string(),
            digest_hex: digest_hex.to_string(),
        })
    }
}

/// Generate a new API key for an agent. Returns `(plaintext, hash)`; the
/// caller surfaces `plaintext` to the agent exactly once, as
/// `api_key_hint` (spec §4.7, §6), and persists only `hash`.
pub fn generate_api_key(cfg: &IdentityConfig) -> (String, ApiKeyHash) {
    let mut key_bytes = vec![0u8; cfg.api_key_bytes];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    let plaintext = hex::encode(&key_bytes);

    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest_hex = ApiKeyHash::compute(&plaintext, &salt);

    (
        plaintext,
        ApiKeyHash {
            salt_hex: hex::encode(salt),
            digest_hex,
        },
    )
}

/// Verify a plaintext API key against its stored hash in constant time
/// (no early return on a mismatching byte, so timing cannot leak how much
/// of the key was right).
pub fn verify_api_key(plaintext: &str, stored: &ApiKeyHash) -> bool {
    let Ok(salt) = hex::decode(&stored.salt_hex) else {
        return false;
    };
    let candidate = ApiKeyHash::compute(plaintext, &salt);
    let a = candidate.as_bytes();
    let b = stored.digest_hex.as_bytes();
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_verifies() {
        let cfg = IdentityConfig::default();
        let (plaintext, hash) = generate_api_key(&cfg);
        assert!(verify_api_key(&plaintext, &hash));
    }

    #[test]
    fn wrong_key_does_not_verify() {
        let cfg = IdentityConfig::default();
        let (_plaintext, hash) = generate_api_key(&cfg);
        assert!(!verify_api_key("wrong-key-entirely", &hash));
    }

    #[test]
    fn stored_round_trips_through_string() {
        let cfg = IdentityConfig::default();
        let (plaintext, hash) = generate_api_key(&cfg);
        let stored = hash.as_stored();
        let parsed = ApiKeyHash::from_stored(&stored).unwrap();
        assert!(verify_api_key(&plaintext, &parsed));
    }

    #[test]
    fn two_keys_for_same_config_differ() {
        let cfg = IdentityConfig::default();
        let (p1, _) = generate_api_key(&cfg);
        let (p2, _) = generate_api_key(&cfg);
        assert_ne!(p1, p2);
    }
}
