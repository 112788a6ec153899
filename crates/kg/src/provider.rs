//! The `KnowledgeGraph` trait (spec §4.11) defines the interface the
//! governance core consumes, independent of backend (SQLite, HTTP).

use async_trait::async_trait;
use sentinel_domain::error::Result;
use sentinel_domain::types::{DiscoveryStatus, Severity};
use uuid::Uuid;

use crate::types::{Discovery, SearchQuery};

/// Abstraction over the shared discovery/knowledge store.
///
/// The core treats the engine as eventually consistent for search, but
/// stores must be durable and visible to the author within their own
/// subsequent searches (read-your-write for the author — spec §4.11).
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Record a new discovery. Returns its id.
    async fn store(
        &self,
        author: Uuid,
        summary: &str,
        details: &str,
        tags: &[String],
        severity: Severity,
        kind: &str,
    ) -> Result<Uuid>;

    /// Ranked search over stored discoveries.
    async fn search(&self, query: SearchQuery) -> Result<Vec<Discovery>>;

    /// Transition a discovery's status.
    async fn update_status(
        &self,
        discovery_id: Uuid,
        new_status: DiscoveryStatus,
        updater: Uuid,
    ) -> Result<()>;

    /// Convenience wrapper: store a note-kind discovery at `Severity::Info`.
    async fn leave_note(&self, author: Uuid, content: &str, tags: &[String]) -> Result<Uuid> {
        self.store(author, content, content, tags, Severity::Info, "note")
            .await
    }
}
