//! Builds a [`CallerContext`] from the transport's headers (spec §4.8 step
//! 1: "resolve identity").
//!
//! The session identifier and any explicit credentials are "supplied
//! out-of-band" per spec §6 — here that means headers rather than the
//! request body, so every operation's argument struct stays exactly the
//! shape spec §6 describes.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use sentinel_domain::operation::CallerContext;

const SESSION_HEADER: &str = "x-session-key";
const AGENT_ID_HEADER: &str = "x-agent-id";
const API_KEY_HEADER: &str = "x-api-key";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Build the caller context for one request.
///
/// `admin_token_hash` is `None` when admin gating is disabled (spec §9):
/// in that case `is_admin` is always `false`, never silently `true`.
pub fn caller_context(headers: &HeaderMap, admin_token_hash: Option<&[u8]>) -> CallerContext {
    let is_admin = match admin_token_hash {
        None => false,
        Some(expected) => {
            let provided = header_str(headers, "authorization")
                .and_then(|v| v.strip_prefix("Bearer "))
                .unwrap_or("");
            let provided_hash = Sha256::digest(provided.as_bytes());
            !provided.is_empty() && bool::from(provided_hash.ct_eq(expected))
        }
    };

    CallerContext {
        session_key: header_str(headers, SESSION_HEADER).map(str::to_string),
        agent_id: header_str(headers, AGENT_ID_HEADER).map(str::to_string),
        api_key: header_str(headers, API_KEY_HEADER).map(str::to_string),
        is_admin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn no_admin_token_never_grants_admin() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer anything"));
        let caller = caller_context(&headers, None);
        assert!(!caller.is_admin);
    }

    #[test]
    fn matching_bearer_token_grants_admin() {
        let secret = b"correct-horse";
        let hash = Sha256::digest(secret);
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer correct-horse"));
        let caller = caller_context(&headers, Some(&hash));
        assert!(caller.is_admin);
    }

    #[test]
    fn wrong_bearer_token_is_rejected() {
        let hash = Sha256::digest(b"correct-horse");
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer wrong"));
        let caller = caller_context(&headers, Some(&hash));
        assert!(!caller.is_admin);
    }

    #[test]
    fn session_and_credential_headers_are_carried_through() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("sess-1"));
        headers.insert(AGENT_ID_HEADER, HeaderValue::from_static("agent-1"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("key-1"));
        let caller = caller_context(&headers, None);
        assert_eq!(caller.session_key.as_deref(), Some("sess-1"));
        assert_eq!(caller.agent_id.as_deref(), Some("agent-1"));
        assert_eq!(caller.api_key.as_deref(), Some("key-1"));
    }
}
