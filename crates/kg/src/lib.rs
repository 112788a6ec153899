//! Knowledge graph interface (spec §4.11): the `KnowledgeGraph` trait, a
//! SQLite-backed default implementation, and an HTTP adapter for an
//! external discovery service.
//!
//! Use [`create_knowledge_graph`] to build the right implementation based
//! on `KgConfig::backend`:
//!
//! | Backend  | Implementation          |
//! |----------|--------------------------|
//! | `sqlite` | [`SqliteKnowledgeGraph`] |
//! | `http`   | [`HttpKnowledgeGraph`]   |

pub mod http;
pub mod provider;
pub mod sqlite;
pub mod types;

pub use http::HttpKnowledgeGraph;
pub use provider::KnowledgeGraph;
pub use sqlite::SqliteKnowledgeGraph;
pub use types::{Discovery, SearchQuery};

use std::path::Path;
use std::sync::Arc;

use sentinel_domain::config::{KgBackend, KgConfig};
use sentinel_domain::error::Result;

/// Create the appropriate [`KnowledgeGraph`] based on `cfg.backend`.
///
/// `sqlite_path` is used only for the `Sqlite` backend — callers
/// typically pass the same database file the rest of the store uses.
pub fn create_knowledge_graph(
    cfg: &KgConfig,
    sqlite_path: &Path,
) -> Result<Arc<dyn KnowledgeGraph>> {
    match cfg.backend {
        KgBackend::Sqlite => Ok(Arc::new(SqliteKnowledgeGraph::open(sqlite_path)?)),
        KgBackend::Http => Ok(Arc::new(HttpKnowledgeGraph::new(cfg)?)),
    }
}
