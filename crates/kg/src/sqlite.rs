//! Default `KnowledgeGraph` backend: same SQLite database as the rest of
//! the store (spec §6 `discoveries` table).
//!
//! Grounded on the same pattern as `sentinel-store::sqlite` /
//! `sentinel-dialectic::store` (itself grounded on the pack's
//! `agtrace-index/src/db.rs`): one connection behind a lock, schema-on-open,
//! transactional writes.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sentinel_domain::error::{Error, Result};
use sentinel_domain::trace::TraceEvent;
use sentinel_domain::types::{DiscoveryStatus, Severity};
use uuid::Uuid;

use crate::provider::KnowledgeGraph;
use crate::types::{Discovery, SearchQuery};

pub struct SqliteKnowledgeGraph {
    conn: Mutex<Connection>,
}

impl SqliteKnowledgeGraph {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Storage(format!("opening {}: {e}", db_path.display())))?;
        let kg = Self {
            conn: Mutex::new(conn),
        };
        kg.init_schema()?;
        Ok(kg)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("opening in-memory db: {e}")))?;
        let kg = Self {
            conn: Mutex::new(conn),
        };
        kg.init_schema()?;
        Ok(kg)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS discoveries (
                id TEXT PRIMARY KEY,
                author_uuid TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                severity TEXT NOT NULL,
                tags_json TEXT NOT NULL,
                summary TEXT NOT NULL,
                details TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_discoveries_author ON discoveries(author_uuid);
            CREATE INDEX IF NOT EXISTS idx_discoveries_timestamp ON discoveries(timestamp DESC);
            "#,
            )
            .map_err(|e| Error::Storage(format!("init schema: {e}")))?;
        Ok(())
    }

    fn row_to_discovery(
        id: String,
        author_uuid: String,
        timestamp: String,
        severity: String,
        tags_json: String,
        summary: String,
        details: String,
        kind: String,
        status: String,
    ) -> Result<Discovery> {
        Ok(Discovery {
            id: id
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt discovery id: {e}")))?,
            author_uuid: author_uuid
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt author uuid: {e}")))?,
            timestamp: timestamp
                .parse::<DateTime<Utc>>()
                .map_err(|e| Error::Storage(format!("corrupt timestamp: {e}")))?,
            severity: severity
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt severity: {e}")))?,
            tags: serde_json::from_str(&tags_json)?,
            summary,
            details,
            kind,
            status: status
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt status: {e}")))?,
        })
    }
}

#[async_trait]
impl KnowledgeGraph for SqliteKnowledgeGraph {
    async fn store(
        &self,
        author: Uuid,
        summary: &str,
        details: &str,
        tags: &[String],
        severity: Severity,
        kind: &str,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let tags_json = serde_json::to_string(tags)?;

        self.conn
            .lock()
            .execute(
                r#"
            INSERT INTO discoveries (id, author_uuid, timestamp, severity, tags_json, summary, details, kind, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
                params![
                    id.to_string(),
                    author.to_string(),
                    now.to_rfc3339(),
                    severity.as_str(),
                    tags_json,
                    summary,
                    details,
                    kind,
                    DiscoveryStatus::Open.as_str(),
                ],
            )
            .map_err(|e| Error::Storage(format!("insert discovery: {e}")))?;

        TraceEvent::KnowledgeDiscoveryStored {
            discovery_id: id.to_string(),
            author_uuid: author.to_string(),
        }
        .emit();

        Ok(id)
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<Discovery>> {
        let conn = self.conn.lock();
        let mut sql = String::from(
            "SELECT id, author_uuid, timestamp, severity, tags_json, summary, details, kind, status FROM discoveries WHERE 1=1",
        );
        if query.text.is_some() {
            sql.push_str(" AND (summary LIKE ?1 OR details LIKE ?1)");
        }
        if query.severity.is_some() {
            sql.push_str(" AND severity = ?2");
        }
        if query.author.is_some() {
            sql.push_str(" AND author_uuid = ?3");
        }
        sql.push_str(" ORDER BY timestamp DESC LIMIT ?4");

        let text_param = query
            .text
            .as_deref()
            .map(|t| format!("%{t}%"))
            .unwrap_or_default();
        let severity_param = query.severity.map(|s| s.as_str()).unwrap_or_default();
        let author_param = query
            .author
            .map(|a| a.to_string())
            .unwrap_or_default();
        let limit = if query.limit == 0 { 100 } else { query.limit } as i64;

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Storage(format!("prepare search: {e}")))?;
        let rows = stmt
            .query_map(
                params![text_param, severity_param, author_param, limit],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )
            .map_err(|e| Error::Storage(format!("query search: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, author_uuid, timestamp, severity, tags_json, summary, details, kind, status) =
                row.map_err(|e| Error::Storage(format!("read discovery row: {e}")))?;
            let discovery = Self::row_to_discovery(
                id,
                author_uuid,
                timestamp,
                severity,
                tags_json,
                summary,
                details,
                kind,
                status,
            )?;
            if let Some(ref wanted) = query.tags {
                if !wanted.iter().all(|t| discovery.tags.contains(t)) {
                    continue;
                }
            }
            out.push(discovery);
        }
        Ok(out)
    }

    async fn update_status(
        &self,
        discovery_id: Uuid,
        new_status: DiscoveryStatus,
        _updater: Uuid,
    ) -> Result<()> {
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE discoveries SET status = ?1 WHERE id = ?2",
                params![new_status.as_str(), discovery_id.to_string()],
            )
            .map_err(|e| Error::Storage(format!("update status: {e}")))?;
        if changed == 0 {
            return Err(Error::NotFound(format!("discovery {discovery_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_search_finds_it_for_the_author() {
        let kg = SqliteKnowledgeGraph::open_in_memory().unwrap();
        let author = Uuid::new_v4();
        let id = kg
            .store(
                author,
                "spike in entropy",
                "observed S rising across three updates",
                &["entropy".into(), "anomaly".into()],
                Severity::Medium,
                "pattern",
            )
            .await
            .unwrap();

        let results = kg
            .search(SearchQuery {
                author: Some(author),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
        assert_eq!(results[0].status, DiscoveryStatus::Open);
    }

    #[tokio::test]
    async fn search_filters_by_text_and_tags() {
        let kg = SqliteKnowledgeGraph::open_in_memory().unwrap();
        let author = Uuid::new_v4();
        kg.store(author, "cascade risk", "x", &["cascade".into()], Severity::High, "pattern")
            .await
            .unwrap();
        kg.store(author, "benign note", "y", &["misc".into()], Severity::Info, "note")
            .await
            .unwrap();

        let results = kg
            .search(SearchQuery {
                text: Some("cascade".into()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary, "cascade risk");

        let tagged = kg
            .search(SearchQuery {
                tags: Some(vec!["misc".into()]),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].summary, "benign note");
    }

    #[tokio::test]
    async fn update_status_transitions_and_rejects_missing_id() {
        let kg = SqliteKnowledgeGraph::open_in_memory().unwrap();
        let author = Uuid::new_v4();
        let id = kg
            .store(author, "s", "d", &[], Severity::Low, "pattern")
            .await
            .unwrap();

        kg.update_status(id, DiscoveryStatus::Resolved, author)
            .await
            .unwrap();
        let found = kg
            .search(SearchQuery {
                author: Some(author),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found[0].status, DiscoveryStatus::Resolved);

        let missing = kg
            .update_status(Uuid::new_v4(), DiscoveryStatus::Archived, author)
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn leave_note_defaults_to_info_severity_and_note_kind() {
        let kg = SqliteKnowledgeGraph::open_in_memory().unwrap();
        let author = Uuid::new_v4();
        kg.leave_note(author, "heads up, watched a slow drift", &["fyi".into()])
            .await
            .unwrap();

        let found = kg
            .search(SearchQuery {
                author: Some(author),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found[0].kind, "note");
        assert_eq!(found[0].severity, Severity::Info);
    }
}
