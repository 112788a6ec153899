//! Hard-limit safety check over proposed conditions (spec §4.9).
//!
//! Purely advisory over free-form text, kept conservative per the spec's
//! own instruction: reject on a forbidden-pattern match, or on an
//! explicit numeric risk/threshold mention above
//! `dialectic.hard_limit_threshold`.

use regex::Regex;
use sentinel_domain::config::DialecticConfig;

/// A condition that failed the safety check, with the reason it was
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyViolation {
    pub condition: String,
    pub reason: String,
}

/// Find a bare decimal following a "risk"/"threshold" keyword, e.g.
/// "raise the risk threshold to 0.95" or "risk > 0.92". Only a loose
/// textual heuristic — the check is advisory, not a parser.
fn extract_threshold_mention(text: &str) -> Option<f64> {
    let re = Regex::new(r"(?i)(?:risk|threshold)\D{0,12}?(\d+\.\d+|\d+)").ok()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Check one proposed condition's text against the forbidden-pattern list
/// and the numeric threshold heuristic. Returns `None` if the condition is
/// safe.
pub fn check_condition(condition: &str, cfg: &DialecticConfig) -> Option<SafetyViolation> {
    for pattern in &cfg.forbidden_patterns {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(condition) {
                return Some(SafetyViolation {
                    condition: condition.to_string(),
                    reason: format!("matches forbidden pattern `{pattern}`"),
                });
            }
        }
    }
    if let Some(value) = extract_threshold_mention(condition) {
        if value > cfg.hard_limit_threshold {
            return Some(SafetyViolation {
                condition: condition.to_string(),
                reason: format!(
                    "proposes a threshold of {value} above the hard limit of {}",
                    cfg.hard_limit_threshold
                ),
            });
        }
    }
    None
}

/// Check every proposed condition; `Ok(())` if all are safe, otherwise the
/// first violation found (spec §4.9: "the check is... conservative" — one
/// unsafe condition blocks the whole resolution).
pub fn check_all(conditions: &[String], cfg: &DialecticConfig) -> Result<(), SafetyViolation> {
    for condition in conditions {
        if let Some(violation) = check_condition(condition, cfg) {
            return Err(violation);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_monitoring_is_rejected() {
        let cfg = DialecticConfig::default();
        assert!(check_condition("disable the audit log", &cfg).is_some());
    }

    #[test]
    fn bypass_is_rejected() {
        let cfg = DialecticConfig::default();
        assert!(check_condition("bypass governor review", &cfg).is_some());
    }

    #[test]
    fn high_risk_threshold_mention_is_rejected() {
        let cfg = DialecticConfig::default();
        assert!(check_condition("raise the risk threshold to 0.95", &cfg).is_some());
    }

    #[test]
    fn reasonable_condition_is_safe() {
        let cfg = DialecticConfig::default();
        assert!(check_condition("lower complexity cap to 0.4", &cfg).is_none());
    }

    #[test]
    fn check_all_stops_at_first_violation() {
        let cfg = DialecticConfig::default();
        let conditions = vec!["lower complexity cap to 0.4".to_string(), "disable logging".to_string()];
        assert!(check_all(&conditions, &cfg).is_err());
    }
}
