use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// External model collaborator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for the semantic-embedding and dialectic-assist
/// collaborator (spec §4.3, §4.9). The deterministic local implementation
/// needs none of this; it only applies when an HTTP-backed collaborator is
/// selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollabConfig {
    /// Which collaborator backend to use.
    #[serde(default)]
    pub backend: CollabBackend,
    /// Base URL of the HTTP collaborator, required when `backend` is `Http`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the bearer token sent to the
    /// collaborator, if any.
    #[serde(default)]
    pub auth_env: Option<String>,
    /// Request timeout for a single embedding or dialectic-assist call.
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
    /// Dimensionality of the embedding slice folded into the parameter
    /// fingerprint (spec §4.3).
    #[serde(default = "d_embedding_dim")]
    pub embedding_dim: usize,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            backend: CollabBackend::default(),
            base_url: None,
            auth_env: None,
            timeout_secs: d_timeout_secs(),
            embedding_dim: d_embedding_dim(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollabBackend {
    /// Deterministic, dependency-free embedding and antithesis/synthesis
    /// generation. No network calls; suitable for tests and air-gapped
    /// deployments.
    #[default]
    Local,
    /// Delegates to an HTTP endpoint speaking the collaborator protocol.
    Http,
}

fn d_timeout_secs() -> u64 {
    20
}
fn d_embedding_dim() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_local() {
        assert_eq!(CollabConfig::default().backend, CollabBackend::Local);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: CollabConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.embedding_dim, 64);
    }
}
