//! Agent-id format and reserved-name validation (spec §4.7).

use sentinel_domain::config::IdentityConfig;
use sentinel_domain::error::{Error, Result};

/// Validate a human-facing `agent_id` against the configured pattern and
/// reserved-name/prefix blocklist. Fails fast, before any state is
/// touched (spec §4.7: "Violations fail with `InvalidIdentifier` before
/// any state touch").
pub fn validate_agent_id(agent_id: &str, cfg: &IdentityConfig) -> Result<()> {
    if agent_id.is_empty() || agent_id.len() > 64 {
        return Err(Error::InvalidArgument(format!(
            "agent_id must be 1..64 characters, got {}",
            agent_id.len()
        )));
    }

    let re = regex_lite_compile(&cfg.agent_id_pattern)?;
    if !re.is_match(agent_id) {
        return Err(Error::InvalidArgument(format!(
            "agent_id \"{agent_id}\" does not match required pattern {}",
            cfg.agent_id_pattern
        )));
    }

    let lower = agent_id.to_ascii_lowercase();
    if cfg.reserved_names.iter().any(|n| n.eq_ignore_ascii_case(&lower)) {
        return Err(Error::ReservedName(agent_id.to_string()));
    }
    const RESERVED_PREFIXES: &[&str] = &[
        "system_",
        "admin_",
        "root_",
        "mcp_",
        "governance_",
        "auth_",
    ];
    if RESERVED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return Err(Error::ReservedName(agent_id.to_string()));
    }

    Ok(())
}

// `regex` is a workspace dependency of `sentinel-domain`, not of this
// crate (the pattern is config data, owned there); borrow it here rather
// than adding a second `regex` edge for one call site.
fn regex_lite_compile(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(pattern).map_err(|e| Error::Config(format!("invalid agent_id_pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_id() {
        let cfg = IdentityConfig::default();
        assert!(validate_agent_id("scenario-a1", &cfg).is_ok());
    }

    #[test]
    fn rejects_reserved_name() {
        let cfg = IdentityConfig::default();
        let err = validate_agent_id("admin", &cfg).unwrap_err();
        assert!(matches!(err, Error::ReservedName(_)));
    }

    #[test]
    fn rejects_reserved_prefix() {
        let cfg = IdentityConfig::default();
        let err = validate_agent_id("system_worker", &cfg).unwrap_err();
        assert!(matches!(err, Error::ReservedName(_)));
    }

    #[test]
    fn rejects_bad_characters() {
        let cfg = IdentityConfig::default();
        assert!(validate_agent_id("has a space", &cfg).is_err());
    }

    #[test]
    fn rejects_too_long() {
        let cfg = IdentityConfig::default();
        let long = "a".repeat(65);
        assert!(validate_agent_id(&long, &cfg).is_err());
    }
}
