//! Semantic embedding and LLM-assisted dialectic collaborator (spec §4.3,
//! §4.10): the [`SemanticEmbedder`] and [`DialecticCollaborator`] traits,
//! a deterministic local default, and an HTTP adapter.
//!
//! Use [`create_embedder`] and [`create_dialectic_collaborator`] to build
//! the right implementation based on `CollabConfig::backend`:
//!
//! | Backend | Embedder          | Collaborator                   |
//! |---------|--------------------|---------------------------------|
//! | `local` | [`LocalEmbedder`]  | [`LocalDialecticCollaborator`]  |
//! | `http`  | [`HttpEmbedder`]   | [`HttpDialecticCollaborator`]   |

pub mod dialectic;
pub mod embedder;
pub mod http;
pub mod local;

pub use dialectic::{CollaboratorOutput, DialecticCollaborator, ThesisInput};
pub use embedder::SemanticEmbedder;
pub use http::{HttpDialecticCollaborator, HttpEmbedder};
pub use local::{LocalDialecticCollaborator, LocalEmbedder};

use std::sync::Arc;

use sentinel_domain::config::{CollabBackend, CollabConfig};
use sentinel_domain::error::Result;

/// Create the appropriate [`SemanticEmbedder`] based on `cfg.backend`.
pub fn create_embedder(cfg: &CollabConfig) -> Result<Arc<dyn SemanticEmbedder>> {
    match cfg.backend {
        CollabBackend::Local => Ok(Arc::new(LocalEmbedder::new(cfg.embedding_dim))),
        CollabBackend::Http => Ok(Arc::new(HttpEmbedder::new(cfg)?)),
    }
}

/// Create the appropriate [`DialecticCollaborator`] based on `cfg.backend`.
pub fn create_dialectic_collaborator(
    cfg: &CollabConfig,
) -> Result<Arc<dyn DialecticCollaborator>> {
    match cfg.backend {
        CollabBackend::Local => Ok(Arc::new(LocalDialecticCollaborator)),
        CollabBackend::Http => Ok(Arc::new(HttpDialecticCollaborator::new(cfg)?)),
    }
}
