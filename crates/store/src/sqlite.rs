//! Durable SQLite-backed persistence for agent metadata and state (spec
//! §4.6, §6 "Persisted state layout").
//!
//! Grounded on the pack's `agtrace-index` `db.rs`: one `Connection` behind
//! a lock, `CREATE TABLE IF NOT EXISTS` schema-on-open, upsert via `ON
//! CONFLICT`, and `query_row`/`query_map` read helpers. The core's
//! requirement is just atomic single-agent writes and read-your-write
//! consistency for that agent (spec §4.6) — a single-connection SQLite
//! file, with the write path wrapped in a transaction, satisfies both
//! without needing a connection pool.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sentinel_domain::error::{Error, Result};
use sentinel_domain::types::AgentStatus;
use uuid::Uuid;

use crate::agent::AgentMetadata;
use crate::agent_state::AgentState;
use crate::history::HistoryEntry;

/// One `(metadata, live state)` pair as stored for an agent — the unit
/// `AgentStore::save` writes atomically.
pub struct PersistedAgent {
    pub metadata: AgentMetadata,
    pub state: AgentState,
}

/// Owns the single SQLite connection backing the store. Cheap to clone via
/// `Arc` at the call site; the connection itself is serialized behind a
/// `Mutex` since `rusqlite::Connection` is `Send` but not `Sync`.
pub struct AgentStore {
    conn: Mutex<Connection>,
}

impl AgentStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Storage(format!("opening {}: {e}", db_path.display())))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("opening in-memory db: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS agents (
                uuid TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL UNIQUE,
                label TEXT,
                api_key_hash TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                parent_uuid TEXT,
                metadata_json TEXT NOT NULL,
                live_state_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agent_state (
                uuid TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                e REAL NOT NULL,
                i REAL NOT NULL,
                s REAL NOT NULL,
                v REAL NOT NULL,
                coherence REAL,
                risk REAL NOT NULL,
                lambda1 REAL NOT NULL,
                verdict TEXT NOT NULL,
                FOREIGN KEY (uuid) REFERENCES agents(uuid)
            );

            CREATE INDEX IF NOT EXISTS idx_agent_state_uuid_time
                ON agent_state(uuid, recorded_at);
            "#,
            )
            .map_err(|e| Error::Storage(format!("init schema: {e}")))?;
        Ok(())
    }

    /// Atomically insert or fully replace one agent's metadata, live
    /// state, and most recent history entry (spec §4.6, §7: "per-update
    /// writes are atomic").
    pub fn save(&self, metadata: &AgentMetadata, state: &AgentState) -> Result<()> {
        let metadata_json = serde_json::to_string(metadata)?;
        let live_state_json = serde_json::to_string(state)?;
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("begin tx: {e}")))?;

        tx.execute(
            r#"
            INSERT INTO agents (uuid, agent_id, label, api_key_hash, status, created_at, updated_at, parent_uuid, metadata_json, live_state_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(uuid) DO UPDATE SET
                label = ?3,
                api_key_hash = ?4,
                status = ?5,
                updated_at = ?7,
                parent_uuid = ?8,
                metadata_json = ?9,
                live_state_json = ?10
            "#,
            params![
                metadata.uuid.to_string(),
                metadata.agent_id,
                metadata.label,
                metadata.api_key_hash,
                metadata.status.as_str(),
                metadata.created_at.to_rfc3339(),
                metadata.updated_at.to_rfc3339(),
                metadata.parent_uuid.map(|u| u.to_string()),
                metadata_json,
                live_state_json,
            ],
        )
        .map_err(|e| Error::Storage(format!("upsert agent: {e}")))?;

        if let Some(entry) = state.history.last() {
            tx.execute(
                r#"
                INSERT INTO agent_state (uuid, recorded_at, e, i, s, v, coherence, risk, lambda1, verdict)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    metadata.uuid.to_string(),
                    entry.timestamp.to_rfc3339(),
                    entry.e,
                    entry.i,
                    entry.s,
                    entry.v,
                    entry.coherence,
                    entry.risk,
                    state.governor.lambda1,
                    entry.verdict.as_str(),
                ],
            )
            .map_err(|e| Error::Storage(format!("append history: {e}")))?;
        }

        tx.commit()
            .map_err(|e| Error::Storage(format!("commit tx: {e}")))?;
        Ok(())
    }

    pub fn load(&self, uuid: Uuid) -> Result<Option<PersistedAgent>> {
        let conn = self.conn.lock();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT metadata_json, live_state_json FROM agents WHERE uuid = ?1",
                [uuid.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| Error::Storage(format!("load agent {uuid}: {e}")))?;

        match row {
            Some((metadata_json, live_state_json)) => {
                let metadata: AgentMetadata = serde_json::from_str(&metadata_json)?;
                let state: AgentState = serde_json::from_str(&live_state_json)?;
                Ok(Some(PersistedAgent { metadata, state }))
            }
            None => Ok(None),
        }
    }

    /// Resolve a human-facing `agent_id` to its UUID (onboarding looks up
    /// whether the id is already claimed).
    pub fn find_uuid_by_agent_id(&self, agent_id: &str) -> Result<Option<Uuid>> {
        let conn = self.conn.lock();
        let raw: Option<String> = conn
            .query_row(
                "SELECT uuid FROM agents WHERE agent_id = ?1",
                [agent_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Storage(format!("lookup agent_id {agent_id}: {e}")))?;
        raw.map(|s| {
            Uuid::parse_str(&s).map_err(|e| Error::Storage(format!("corrupt uuid in store: {e}")))
        })
        .transpose()
    }

    /// List agent metadata, most recently updated first, with pagination
    /// (spec §6 `list_agents`; optionally filtered by status).
    pub fn list_agents(
        &self,
        status: Option<AgentStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AgentMetadata>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT metadata_json FROM agents
                WHERE (?1 IS NULL OR status = ?1)
                ORDER BY updated_at DESC
                LIMIT ?2 OFFSET ?3
                "#,
            )
            .map_err(|e| Error::Storage(format!("prepare list_agents: {e}")))?;

        let rows = stmt
            .query_map(
                params![status.map(|s| s.as_str()), limit as i64, offset as i64],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| Error::Storage(format!("query list_agents: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|e| Error::Storage(format!("read row: {e}")))?;
            out.push(serde_json::from_str(&json)?);
        }
        Ok(out)
    }

    /// Durable history slice for `get_history` (spec §6), independent of
    /// the in-memory ring, since the ring only keeps the hot tail.
    pub fn history_slice(&self, uuid: Uuid, limit: usize) -> Result<Vec<PersistedHistoryRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT recorded_at, e, i, s, v, coherence, risk, lambda1, verdict
                FROM agent_state
                WHERE uuid = ?1
                ORDER BY recorded_at DESC
                LIMIT ?2
                "#,
            )
            .map_err(|e| Error::Storage(format!("prepare history_slice: {e}")))?;

        let rows = stmt
            .query_map(params![uuid.to_string(), limit as i64], |row| {
                let recorded_at: String = row.get(0)?;
                Ok(PersistedHistoryRow {
                    recorded_at: recorded_at
                        .parse()
                        .unwrap_or_else(|_| Utc::now()),
                    e: row.get(1)?,
                    i: row.get(2)?,
                    s: row.get(3)?,
                    v: row.get(4)?,
                    coherence: row.get(5)?,
                    risk: row.get(6)?,
                    lambda1: row.get(7)?,
                    verdict: row.get(8)?,
                })
            })
            .map_err(|e| Error::Storage(format!("query history_slice: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Storage(format!("read history_slice row: {e}")))?;
        Ok(rows)
    }
}

/// One durable row from the `agent_state` table (spec §6), newest first.
#[derive(Debug, Clone)]
pub struct PersistedHistoryRow {
    pub recorded_at: DateTime<Utc>,
    pub e: f64,
    pub i: f64,
    pub s: f64,
    pub v: f64,
    pub coherence: Option<f64>,
    pub risk: f64,
    pub lambda1: f64,
    pub verdict: String,
}

impl From<&HistoryEntry> for PersistedHistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            recorded_at: entry.timestamp,
            e: entry.e,
            i: entry.i,
            s: entry.s,
            v: entry.v,
            coherence: entry.coherence,
            risk: entry.risk,
            lambda1: 0.0,
            verdict: entry.verdict.as_str().to_string(),
        }
    }
}
