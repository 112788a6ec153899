use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Identity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Agent identity, API key, and session-binding settings (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Regex an agent_id must match at onboarding time.
    #[serde(default = "d_agent_id_pattern")]
    pub agent_id_pattern: String,
    /// agent_id values that can never be claimed (case-insensitive),
    /// regardless of whether they match `agent_id_pattern`.
    #[serde(default = "d_reserved_names")]
    pub reserved_names: Vec<String>,
    /// Byte length of generated API keys, before hex encoding.
    #[serde(default = "d_api_key_bytes")]
    pub api_key_bytes: usize,
    /// How long a session-to-agent binding is honored with no activity
    /// before it is evicted and must be re-established.
    #[serde(default = "d_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            agent_id_pattern: d_agent_id_pattern(),
            reserved_names: d_reserved_names(),
            api_key_bytes: d_api_key_bytes(),
            session_ttl_secs: d_session_ttl_secs(),
        }
    }
}

fn d_agent_id_pattern() -> String {
    r"^[A-Za-z0-9_-]{1,64}$".into()
}

fn d_reserved_names() -> Vec<String> {
    [
        "system", "admin", "root", "null", "mcp", "governance", "monitor", "sentinel",
        "undefined", "anonymous",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn d_api_key_bytes() -> usize {
    32
}

fn d_session_ttl_secs() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reserved_names_include_admin() {
        let cfg = IdentityConfig::default();
        assert!(cfg.reserved_names.iter().any(|n| n == "admin"));
    }

    #[test]
    fn default_pattern_compiles() {
        let cfg = IdentityConfig::default();
        assert!(regex::Regex::new(&cfg.agent_id_pattern).is_ok());
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: IdentityConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.api_key_bytes, 32);
        assert_eq!(cfg.session_ttl_secs, 3600);
    }
}
