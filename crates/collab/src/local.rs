//! Deterministic, dependency-free default implementations of
//! [`SemanticEmbedder`] and [`DialecticCollaborator`] (`CollabBackend::Local`).
//!
//! No network calls; suitable for tests and air-gapped deployments. The
//! embedder uses feature hashing over whitespace-tokenized words so the
//! same text always yields the same vector (spec §8 round-trip property).

use async_trait::async_trait;
use sentinel_domain::error::Result;
use sha2::{Digest, Sha256};

use crate::dialectic::{CollaboratorOutput, DialecticCollaborator, ThesisInput};
use crate::embedder::SemanticEmbedder;

/// Hashes each word of the input into one of `dim` buckets and accumulates
/// a signed count, then L2-normalizes. Two texts sharing vocabulary land
/// closer together; unrelated texts are close to orthogonal.
pub struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Default for LocalEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl SemanticEmbedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let mut v = vec![0.0f64; self.dim];
        for word in text.split_whitespace() {
            let digest = Sha256::digest(word.as_bytes());
            let bucket = (u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
                as usize)
                % self.dim;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Rule-based stand-in for an LLM reviewer: deterministic and conservative.
///
/// The antithesis always raises a concern when the thesis offers no
/// `root_cause`, and otherwise echoes the proposed conditions back
/// tightened by a generic "monitor closely" addition. Synthesis agrees
/// only when thesis and antithesis conditions already overlap, mirroring
/// the convergence check a real reviewer pair would apply.
#[derive(Debug, Default)]
pub struct LocalDialecticCollaborator;

#[async_trait]
impl DialecticCollaborator for LocalDialecticCollaborator {
    async fn antithesis(&self, thesis: ThesisInput<'_>) -> Result<CollaboratorOutput> {
        let mut concerns = Vec::new();
        if thesis.root_cause.is_none() {
            concerns.push("no root cause identified in thesis".to_owned());
        }
        if thesis.proposed_conditions.is_empty() {
            concerns.push("no resume conditions proposed".to_owned());
        }

        let mut proposed_conditions: Vec<String> = thesis.proposed_conditions.to_vec();
        proposed_conditions.push("monitor closely for one additional cycle".to_owned());

        Ok(CollaboratorOutput {
            root_cause: thesis.root_cause.map(str::to_owned),
            concerns,
            proposed_conditions,
            agrees: Some(false),
        })
    }

    async fn synthesis(
        &self,
        thesis: ThesisInput<'_>,
        antithesis: &CollaboratorOutput,
    ) -> Result<CollaboratorOutput> {
        let overlap = thesis
            .proposed_conditions
            .iter()
            .any(|c| antithesis.proposed_conditions.iter().any(|a| a == c));

        let mut proposed_conditions: Vec<String> = thesis.proposed_conditions.to_vec();
        for c in &antithesis.proposed_conditions {
            if !proposed_conditions.contains(c) {
                proposed_conditions.push(c.clone());
            }
        }

        Ok(CollaboratorOutput {
            root_cause: thesis
                .root_cause
                .map(str::to_owned)
                .or_else(|| antithesis.root_cause.clone()),
            concerns: antithesis.concerns.clone(),
            proposed_conditions,
            agrees: Some(overlap || thesis.root_cause.is_some()),
        })
    }
}
