use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Admin
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Gating for lifecycle operations (archive, delete, update_metadata,
/// list_agents) that a caller should not reach with only an agent's own
/// API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Environment variable holding the admin bearer token.
    /// If the env var is unset, admin-gated operations are **disabled**
    /// (rejected with `AuthRequired`), not silently open.
    #[serde(default = "d_admin_token_env")]
    pub token_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            token_env: d_admin_token_env(),
        }
    }
}

fn d_admin_token_env() -> String {
    "SENTINEL_ADMIN_TOKEN".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_token_env_name() {
        assert_eq!(AdminConfig::default().token_env, "SENTINEL_ADMIN_TOKEN");
    }
}
