//! Reviewer selection: weighted random draw over an authority score (spec
//! §4.9).
//!
//! Eligibility (`risk < 0.40`, `coherence >= 0.50`, not the paused agent,
//! no recent review of this agent within the pool window) is the caller's
//! job — `sentinel-governance` assembles the candidate pool from the agent
//! store before calling into this module, since that requires reading
//! every agent's live state, which this crate has no handle to.

use rand::Rng;
use uuid::Uuid;

/// One agent eligible to review a paused peer, with the inputs to the
/// authority score (spec §4.9).
#[derive(Debug, Clone, Copy)]
pub struct ReviewerCandidate {
    pub agent_uuid: Uuid,
    /// `1 - risk`, or an equivalent health measure in `[0, 1]`.
    pub health: f64,
    /// Historical reliability as a reviewer, in `[0, 1]`.
    pub track_record: f64,
    /// Topical closeness to the paused agent, in `[0, 1]`.
    pub domain_affinity: f64,
    /// Recency of this candidate's own last activity, in `[0, 1]`.
    pub freshness: f64,
}

impl ReviewerCandidate {
    /// `0.4*health + 0.3*track_record + 0.2*domain_affinity + 0.1*freshness`
    /// (spec §4.9).
    pub fn authority_score(&self) -> f64 {
        0.4 * self.health + 0.3 * self.track_record + 0.2 * self.domain_affinity + 0.1 * self.freshness
    }
}

/// Pick one reviewer from `pool` via a weighted random draw on authority
/// score. `None` if the pool is empty — the caller falls back to
/// LLM-assisted dialectic (spec §4.9, §4.10).
pub fn select_reviewer<R: Rng + ?Sized>(pool: &[ReviewerCandidate], rng: &mut R) -> Option<Uuid> {
    if pool.is_empty() {
        return None;
    }
    let total: f64 = pool.iter().map(|c| c.authority_score().max(0.0)).sum();
    if total <= 0.0 {
        // Degenerate case: every candidate scored zero. Fall back to a
        // uniform draw rather than returning nothing.
        let idx = rng.gen_range(0..pool.len());
        return Some(pool[idx].agent_uuid);
    }
    let mut draw = rng.gen_range(0.0..total);
    for candidate in pool {
        let weight = candidate.authority_score().max(0.0);
        if draw < weight {
            return Some(candidate.agent_uuid);
        }
        draw -= weight;
    }
    pool.last().map(|c| c.agent_uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn candidate(score_bias: f64) -> ReviewerCandidate {
        ReviewerCandidate {
            agent_uuid: Uuid::new_v4(),
            health: score_bias,
            track_record: score_bias,
            domain_affinity: score_bias,
            freshness: score_bias,
        }
    }

    #[test]
    fn empty_pool_returns_none() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert!(select_reviewer(&[], &mut rng).is_none());
    }

    #[test]
    fn single_candidate_is_always_picked() {
        let c = candidate(0.8);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert_eq!(select_reviewer(&[c], &mut rng), Some(c.agent_uuid));
    }

    #[test]
    fn zero_weight_pool_falls_back_to_uniform_draw() {
        let pool = [candidate(0.0), candidate(0.0)];
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let picked = select_reviewer(&pool, &mut rng).unwrap();
        assert!(pool.iter().any(|c| c.agent_uuid == picked));
    }

    #[test]
    fn higher_authority_is_picked_more_often() {
        let strong = candidate(1.0);
        let weak = candidate(0.01);
        let pool = [strong, weak];
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut strong_wins = 0;
        for _ in 0..200 {
            if select_reviewer(&pool, &mut rng) == Some(strong.agent_uuid) {
                strong_wins += 1;
            }
        }
        assert!(strong_wins > 150);
    }
}
