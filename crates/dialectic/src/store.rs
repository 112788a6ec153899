//! Durable persistence for dialectic sessions and their messages (spec
//! §6 "Persisted state layout": `dialectic_sessions`, `dialectic_messages`).
//!
//! Grounded on the same pattern as `sentinel-store::sqlite` (itself
//! grounded on the pack's `agtrace-index/src/db.rs`): one connection
//! behind a lock, schema-on-open, and a transactional write path.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sentinel_domain::error::{Error, Result};
use sentinel_domain::types::DialecticPhase;
use uuid::Uuid;

use crate::session::DialecticSession;

pub struct DialecticStore {
    conn: Mutex<Connection>,
}

impl DialecticStore {
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
            CREATE TABLE IF NOT EXISTS dialectic_sessions (
                session_id TEXT PRIMARY KEY,
                paused_uuid TEXT NOT NULL,
                reviewer_uuid TEXT NOT NULL,
                phase TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                resolution_json TEXT
            );

            CREATE TABLE IF NOT EXISTS dialectic_messages (
                session_id TEXT NOT NULL,
                ordinal INTEGER NOT NULL,
                type TEXT NOT NULL,
                author_uuid TEXT NOT NULL,
                content_json TEXT NOT NULL,
                signature TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (session_id, ordinal),
                FOREIGN KEY (session_id) REFERENCES dialectic_sessions(session_id)
            );

            CREATE INDEX IF NOT EXISTS idx_dialectic_messages_session
                ON dialectic_messages(session_id);
            "#,
            )
            .map_err(|e| Error::Storage(format!("init schema: {e}")))?;
        Ok(())
    }

    /// Persist the full session state: the session row plus every message
    /// (messages are append-only in memory, so re-writing the whole set
    /// inside one transaction is simpler than diffing and still atomic).
    pub fn save(&self, session: &DialecticSession) -> Result<()> {
        let resolution_json = session
            .resolution
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("begin tx: {e}")))?;

        tx.execute(
            r#"
            INSERT INTO dialectic_sessions (session_id, paused_uuid, reviewer_uuid, phase, created_at, updated_at, resolution_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(session_id) DO UPDATE SET
                phase = ?4,
                updated_at = ?6,
                resolution_json = ?7
            "#,
            params![
                session.session_id.to_string(),
                session.paused_agent_id.to_string(),
                session.reviewer_agent_id.to_string(),
                session.phase.as_str(),
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
                resolution_json,
            ],
        )
        .map_err(|e| Error::Storage(format!("upsert session: {e}")))?;

        tx.execute(
            "DELETE FROM dialectic_messages WHERE session_id = ?1",
            [session.session_id.to_string()],
        )
        .map_err(|e| Error::Storage(format!("clear messages: {e}")))?;

        for message in &session.messages {
            let content_json = serde_json::to_string(message)?;
            tx.execute(
                r#"
                INSERT INTO dialectic_messages (session_id, ordinal, type, author_uuid, content_json, signature, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    session.session_id.to_string(),
                    message.ordinal,
                    format!("{:?}", message.kind).to_lowercase(),
                    message.author_uuid.to_string(),
                    content_json,
                    message.signature,
                    message.timestamp.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Storage(format!("insert message: {e}")))?;
        }

        tx.commit()
            .map_err(|e| Error::Storage(format!("commit tx: {e}")))?;
        Ok(())
    }

    pub fn load(&self, session_id: Uuid) -> Result<Option<DialecticSession>> {
        let conn = self.conn.lock();
        let row: Option<(String, String, String, String, String, Option<String>)> = conn
            .query_row(
                r#"
                SELECT paused_uuid, reviewer_uuid, phase, created_at, updated_at, resolution_json
                FROM dialectic_sessions WHERE session_id = ?1
                "#,
                [session_id.to_string()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| Error::Storage(format!("load session {session_id}: {e}")))?;

        let Some((paused, reviewer, phase, created_at, updated_at, resolution_json)) = row else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT content_json FROM dialectic_messages WHERE session_id = ?1 ORDER BY ordinal")
            .map_err(|e| Error::Storage(format!("prepare messages: {e}")))?;
        let messages = stmt
            .query_map([session_id.to_string()], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Storage(format!("query messages: {e}")))?
            .map(|r| {
                let json = r.map_err(|e| Error::Storage(format!("read message row: {e}")))?;
                serde_json::from_str(&json).map_err(Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        let phase: DialecticPhase = phase
            .parse_phase()
            .ok_or_else(|| Error::Storage(format!("corrupt phase value: {phase}")))?;

        Ok(Some(DialecticSession::from_parts(
            session_id,
            paused
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt uuid: {e}")))?,
            reviewer
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt uuid: {e}")))?,
            phase,
            created_at
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt timestamp: {e}")))?,
            updated_at
                .parse()
                .map_err(|e| Error::Storage(format!("corrupt timestamp: {e}")))?,
            resolution_json
                .map(|j| serde_json::from_str(&j))
                .transpose()?,
            messages,
        )))
    }
}

trait ParsePhase {
    fn parse_phase(&self) -> Option<DialecticPhase>;
}

impl ParsePhase for str {
    fn parse_phase(&self) -> Option<DialecticPhase> {
        match self {
            "thesis" => Some(DialecticPhase::Thesis),
            "antithesis" => Some(DialecticPhase::Antithesis),
            "synthesis" => Some(DialecticPhase::Synthesis),
            "resolved" => Some(DialecticPhase::Resolved),
            "escalated" => Some(DialecticPhase::Escalated),
            "failed" => Some(DialecticPhase::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MessageKind;
    use sentinel_domain::config::DialecticConfig;

    #[test]
    fn save_then_load_round_trips_session_and_messages() {
        let store = DialecticStore::open_in_memory().unwrap();
        let mut session = DialecticSession::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let cfg = DialecticConfig::default();
        session
            .submit(
                MessageKind::Thesis,
                session.paused_agent_id,
                "because".into(),
                vec!["lower cap".into()],
                Some("spike".into()),
                serde_json::json!({}),
                None,
                b"secret",
                &cfg,
            )
            .unwrap();

        store.save(&session).unwrap();
        let loaded = store.load(session.session_id).unwrap().unwrap();
        assert_eq!(loaded.phase, session.phase);
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].reasoning, "because");
    }

    #[test]
    fn load_missing_session_is_none() {
        let store = DialecticStore::open_in_memory().unwrap();
        assert!(store.load(Uuid::new_v4()).unwrap().is_none());
    }
}
