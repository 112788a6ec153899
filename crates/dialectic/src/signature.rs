//! HMAC signing of dialectic messages (spec §4.9: "every phase transition
//! records a signed entry").
//!
//! Grounded on `sentinel-identity`'s `api_key.rs` — same `Hmac<Sha256>` +
//! `subtle::ConstantTimeEq` pairing, here keyed by a server-wide secret
//! rather than a per-agent salt, since the signature authenticates the
//! *system*'s record of the message, not one agent's credential.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Sign `author_uuid + session_id + content + timestamp_rfc3339` with the
/// server secret, returning a lowercase hex digest.
pub fn sign(secret: &[u8], author_uuid: Uuid, session_id: Uuid, content: &str, timestamp_rfc3339: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(author_uuid.as_bytes());
    mac.update(session_id.as_bytes());
    mac.update(content.as_bytes());
    mac.update(timestamp_rfc3339.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a previously computed signature in constant time.
pub fn verify(
    secret: &[u8],
    author_uuid: Uuid,
    session_id: Uuid,
    content: &str,
    timestamp_rfc3339: &str,
    signature: &str,
) -> bool {
    let expected = sign(secret, author_uuid, session_id, content, timestamp_rfc3339);
    let (Ok(a), Ok(b)) = (hex::decode(&expected), hex::decode(signature)) else {
        return false;
    };
    a.ct_eq(&b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let secret = b"server-secret";
        let author = Uuid::new_v4();
        let session = Uuid::new_v4();
        let sig = sign(secret, author, session, "hello", "2026-01-01T00:00:00Z");
        assert!(verify(secret, author, session, "hello", "2026-01-01T00:00:00Z", &sig));
    }

    #[test]
    fn tampered_content_fails_verification() {
        let secret = b"server-secret";
        let author = Uuid::new_v4();
        let session = Uuid::new_v4();
        let sig = sign(secret, author, session, "hello", "2026-01-01T00:00:00Z");
        assert!(!verify(secret, author, session, "goodbye", "2026-01-01T00:00:00Z", &sig));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let author = Uuid::new_v4();
        let session = Uuid::new_v4();
        let sig = sign(b"secret-a", author, session, "hello", "2026-01-01T00:00:00Z");
        assert!(!verify(b"secret-b", author, session, "hello", "2026-01-01T00:00:00Z", &sig));
    }
}
