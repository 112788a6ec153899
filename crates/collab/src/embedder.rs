//! `SemanticEmbedder`: produces the 64-dim semantic slice folded into the
//! parameter fingerprint (spec §4.3, §9 open question — "exact form and
//! dimensions... left to the implementer; only the property is required").

use async_trait::async_trait;
use sentinel_domain::error::Result;

/// A deterministic, bounded text embedder.
///
/// Implementations must be pure: the same input text always yields the
/// same vector (spec §8, "round-trip"). The vector length is fixed per
/// implementation via [`SemanticEmbedder::dim`].
#[async_trait]
pub trait SemanticEmbedder: Send + Sync {
    /// Embed `text` into a bounded vector of length `self.dim()`.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// The embedding dimensionality this implementation produces.
    fn dim(&self) -> usize;
}
