//! Matching rules for synthesis convergence (spec §4.9): "both most-recent
//! synthesis messages from each party have `agrees=true` on matching
//! `root_cause` and `proposed_conditions`."

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn root_cause_matches(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => normalize(a) == normalize(b),
        (None, None) => true,
        _ => false,
    }
}

pub fn conditions_match(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<String> = a.iter().map(|s| normalize(s)).collect();
    let mut b: Vec<String> = b.iter().map(|s| normalize(s)).collect();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_conditions_match_regardless_of_order() {
        let a = vec!["Lower complexity cap".to_string(), "Add review".to_string()];
        let b = vec!["add review".to_string(), "lower complexity cap".to_string()];
        assert!(conditions_match(&a, &b));
    }

    #[test]
    fn different_condition_sets_do_not_match() {
        let a = vec!["lower complexity cap".to_string()];
        let b = vec!["raise timeout".to_string()];
        assert!(!conditions_match(&a, &b));
    }

    #[test]
    fn root_cause_matches_case_insensitively() {
        assert!(root_cause_matches(Some("External Spike"), Some("external spike")));
        assert!(!root_cause_matches(Some("a"), Some("b")));
        assert!(!root_cause_matches(Some("a"), None));
    }
}
