//! The `discoveries` record shape (spec §6): what gets stored, searched,
//! and status-transitioned through the knowledge graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sentinel_domain::types::{DiscoveryStatus, Severity};

/// A single stored discovery or note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub id: Uuid,
    pub author_uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub summary: String,
    pub details: String,
    /// Free-form classification (e.g. "pattern", "anomaly", "note").
    pub kind: String,
    pub status: DiscoveryStatus,
}

/// Filter criteria for `KnowledgeGraph::search`. Every field is optional;
/// an empty query matches everything up to `limit`.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub severity: Option<Severity>,
    pub author: Option<Uuid>,
    pub limit: usize,
}
