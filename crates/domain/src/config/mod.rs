mod admin;
mod collab;
mod dialectic;
mod identity;
mod kg;
mod observability;
mod profile;
mod server;
mod store;

pub use admin::*;
pub use collab::*;
pub use dialectic::*;
pub use identity::*;
pub use kg::*;
pub use observability::*;
pub use profile::*;
pub use server::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub profile: ParameterProfileConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub dialectic: DialecticConfig,
    #[serde(default)]
    pub collab: CollabConfig,
    #[serde(default)]
    pub kg: KgConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Errors should block
    /// startup; warnings should only be logged (spec §5's exit-code
    /// contract: code 2 is reserved for validation errors).
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.server.request_timeout_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.request_timeout_secs".into(),
                message: "request_timeout_secs must be greater than 0".into(),
            });
        }

        if self.server.cors.allowed_origins.len() == 1 && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)"
                    .into(),
            });
        }

        // ── observability ───────────────────────────────────────────
        if let Some(endpoint) = &self.observability.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "observability.otlp_endpoint".into(),
                    message: format!(
                        "otlp_endpoint must start with http:// or https:// (got \"{endpoint}\")"
                    ),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "observability.sample_rate".into(),
                message: "sample_rate must be between 0.0 and 1.0".into(),
            });
        }

        // ── dynamics profile ────────────────────────────────────────
        if self.profile.dt <= 0.0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.dt".into(),
                message: "dt must be greater than 0".into(),
            });
        }
        if self.profile.weights.engagement < 0.0
            || self.profile.weights.internal_state < 0.0
            || self.profile.weights.entropy < 0.0
            || self.profile.weights.void_pressure < 0.0
            || self.profile.weights.drift < 0.0
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "profile.weights".into(),
                message: "objective weights are conventionally non-negative".into(),
            });
        }
        let (e_lo, e_hi) = self.profile.clip.engagement;
        if e_lo >= e_hi {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.clip.engagement".into(),
                message: "lower bound must be less than upper bound".into(),
            });
        }
        let (i_lo, i_hi) = self.profile.clip.internal_state;
        if i_lo >= i_hi {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.clip.internal_state".into(),
                message: "lower bound must be less than upper bound".into(),
            });
        }
        let (s_lo, s_hi) = self.profile.clip.entropy;
        if s_lo >= s_hi {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.clip.entropy".into(),
                message: "lower bound must be less than upper bound".into(),
            });
        }
        let (v_lo, v_hi) = self.profile.clip.void_pressure;
        if v_lo >= v_hi {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.clip.void_pressure".into(),
                message: "lower bound must be less than upper bound".into(),
            });
        }
        if self.profile.lambda1_min > self.profile.lambda1_max {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.lambda1_min".into(),
                message: "lambda1_min must not exceed lambda1_max".into(),
            });
        }
        if self.profile.lambda1_base < self.profile.lambda1_min
            || self.profile.lambda1_base > self.profile.lambda1_max
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "profile.lambda1_base".into(),
                message: "lambda1_base must lie within [lambda1_min, lambda1_max]".into(),
            });
        }

        // ── store ───────────────────────────────────────────────────
        if self.store.history_capacity == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "store.history_capacity".into(),
                message: "history_capacity must be greater than 0".into(),
            });
        }
        if self.store.lock_backoff_base_secs <= 0.0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "store.lock_backoff_base_secs".into(),
                message: "lock_backoff_base_secs must be greater than 0".into(),
            });
        }

        // ── identity ────────────────────────────────────────────────
        if let Err(e) = regex::Regex::new(&self.identity.agent_id_pattern) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "identity.agent_id_pattern".into(),
                message: format!("invalid regex: {e}"),
            });
        }
        if self.identity.api_key_bytes < 16 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "identity.api_key_bytes".into(),
                message: "api_key_bytes below 16 produces weak keys".into(),
            });
        }
        if self.identity.session_ttl_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "identity.session_ttl_secs".into(),
                message: "session_ttl_secs must be greater than 0".into(),
            });
        }

        // ── dialectic ───────────────────────────────────────────────
        if self.dialectic.max_rounds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "dialectic.max_rounds".into(),
                message: "max_rounds must be greater than 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.dialectic.hard_limit_threshold) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "dialectic.hard_limit_threshold".into(),
                message: "hard_limit_threshold must be between 0.0 and 1.0".into(),
            });
        }
        for (i, pattern) in self.dialectic.forbidden_patterns.iter().enumerate() {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("dialectic.forbidden_patterns[{i}]"),
                    message: format!("invalid regex \"{pattern}\": {e}"),
                });
            }
        }

        // ── collab / kg ─────────────────────────────────────────────
        if self.collab.backend == CollabBackend::Http && self.collab.base_url.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "collab.base_url".into(),
                message: "backend = \"http\" requires a base_url".into(),
            });
        }
        if self.kg.backend == KgBackend::Http && self.kg.base_url.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "kg.base_url".into(),
                message: "backend = \"http\" requires a base_url".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field.starts_with(field_prefix))
    }

    #[test]
    fn default_config_passes() {
        let issues = Config::default().validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn server_port_zero_is_error() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        let issue = find_issue(&cfg.validate(), "server.port").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn cors_wildcard_is_warning() {
        let mut cfg = Config::default();
        cfg.server.cors.allowed_origins = vec!["*".into()];
        let issue =
            find_issue(&cfg.validate(), "server.cors.allowed_origins").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn otlp_endpoint_without_scheme_is_error() {
        let mut cfg = Config::default();
        cfg.observability.otlp_endpoint = Some("localhost:4317".into());
        let issue = find_issue(&cfg.validate(), "observability.otlp_endpoint")
            .expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn profile_dt_zero_is_error() {
        let mut cfg = Config::default();
        cfg.profile.dt = 0.0;
        let issue = find_issue(&cfg.validate(), "profile.dt").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn profile_negative_weight_is_warning() {
        let mut cfg = Config::default();
        cfg.profile.weights.void_pressure = -0.1;
        let issue = find_issue(&cfg.validate(), "profile.weights").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn profile_lambda1_base_outside_bounds_is_error() {
        let mut cfg = Config::default();
        cfg.profile.lambda1_base = cfg.profile.lambda1_max + 1.0;
        let issue =
            find_issue(&cfg.validate(), "profile.lambda1_base").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn profile_clip_inverted_range_is_error() {
        let mut cfg = Config::default();
        cfg.profile.clip.engagement = (1.0, 0.0);
        let issue =
            find_issue(&cfg.validate(), "profile.clip.engagement").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn store_history_capacity_zero_is_error() {
        let mut cfg = Config::default();
        cfg.store.history_capacity = 0;
        let issue = find_issue(&cfg.validate(), "store.history_capacity").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn identity_bad_regex_is_error() {
        let mut cfg = Config::default();
        cfg.identity.agent_id_pattern = "(".into();
        let issue =
            find_issue(&cfg.validate(), "identity.agent_id_pattern").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn identity_short_api_key_bytes_is_warning() {
        let mut cfg = Config::default();
        cfg.identity.api_key_bytes = 8;
        let issue =
            find_issue(&cfg.validate(), "identity.api_key_bytes").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn dialectic_max_rounds_zero_is_error() {
        let mut cfg = Config::default();
        cfg.dialectic.max_rounds = 0;
        let issue = find_issue(&cfg.validate(), "dialectic.max_rounds").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn dialectic_threshold_out_of_range_is_error() {
        let mut cfg = Config::default();
        cfg.dialectic.hard_limit_threshold = 1.5;
        let issue = find_issue(&cfg.validate(), "dialectic.hard_limit_threshold")
            .expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn collab_http_backend_without_base_url_is_error() {
        let mut cfg = Config::default();
        cfg.collab.backend = CollabBackend::Http;
        let issue = find_issue(&cfg.validate(), "collab.base_url").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn kg_http_backend_without_base_url_is_error() {
        let mut cfg = Config::default();
        cfg.kg.backend = KgBackend::Http;
        let issue = find_issue(&cfg.validate(), "kg.base_url").expect("expected an issue");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn toml_roundtrip_of_defaults() {
        let cfg = Config::default();
        let s = toml::to_string(&cfg).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.server.port, cfg.server.port);
    }
}
