use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Knowledge graph
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for the shared discovery/knowledge store (spec §4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KgConfig {
    /// Which backend implements the `KnowledgeGraph` trait.
    #[serde(default)]
    pub backend: KgBackend,
    /// Base URL of the HTTP knowledge graph, required when `backend` is
    /// `Http`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the bearer token sent to the HTTP
    /// backend, if any.
    #[serde(default)]
    pub auth_env: Option<String>,
    /// Upper bound on results returned by a single search, regardless of
    /// what the caller requested.
    #[serde(default = "d_max_search_results")]
    pub max_search_results: usize,
}

impl Default for KgConfig {
    fn default() -> Self {
        Self {
            backend: KgBackend::default(),
            base_url: None,
            auth_env: None,
            max_search_results: d_max_search_results(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KgBackend {
    /// Same SQLite database as the rest of the store.
    #[default]
    Sqlite,
    /// Delegates to an external HTTP-backed knowledge service.
    Http,
}

fn d_max_search_results() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_sqlite() {
        assert_eq!(KgConfig::default().backend, KgBackend::Sqlite);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: KgConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.max_search_results, 100);
    }
}
