//! `ServiceContext`: the single long-lived handle every operation is given.
//!
//! Grounded on the pack's `crates/server/src/state.rs` `AppState` — fields
//! grouped by concern under a doc-comment header, everything behind an
//! `Arc` (or `Arc<Mutex<_>>`/`parking_lot` for mutable shared state), built
//! once at startup and cloned cheaply into every handler.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rand::RngCore;
use uuid::Uuid;

use sentinel_collab::{create_dialectic_collaborator, create_embedder, DialecticCollaborator, SemanticEmbedder};
use sentinel_dialectic::DialecticStore;
use sentinel_domain::config::Config;
use sentinel_domain::error::{Error, Result};
use sentinel_identity::SessionStore;
use sentinel_kg::{create_knowledge_graph, KnowledgeGraph};
use sentinel_store::{AgentLockMap, AgentStore};

/// Environment variable holding the HMAC secret used to sign dialectic
/// messages. If unset a random secret is generated at startup — fine for
/// a single long-running process, but it means signatures from a previous
/// run become unverifiable across a restart. Operators running more than
/// one server instance behind the same database should set this.
pub const DIALECTIC_SECRET_ENV: &str = "SENTINEL_DIALECTIC_SECRET";

/// Everything an operation handler needs, built once at startup.
pub struct ServiceContext {
    pub config: Config,

    // Persistence
    pub store: AgentStore,
    pub dialectic_store: DialecticStore,

    // In-memory, short-TTL
    pub sessions: SessionStore,
    pub locks: AgentLockMap,

    // Pluggable backends (spec §4.11, §4.3, §4.10)
    pub kg: Arc<dyn KnowledgeGraph>,
    pub embedder: Arc<dyn SemanticEmbedder>,
    pub collaborator: Arc<dyn DialecticCollaborator>,

    // Dialectic protocol bookkeeping that has no natural home in the
    // store crate (spec §5: reviewer eligibility and open-session counts
    // are governance's business, not the store's).
    signing_secret: Vec<u8>,
    recent_reviewers: Mutex<VecDeque<Uuid>>,
    llm_assisted_sessions: Mutex<HashSet<Uuid>>,
    open_dialectic_sessions: AtomicUsize,

    started_at: Instant,
}

impl ServiceContext {
    /// Build a context backed by the configured SQLite database file.
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.server.db_path.clone();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Config(format!("creating {}: {e}", parent.display())))?;
            }
        }
        let store = AgentStore::open(&db_path)?;
        let dialectic_store = DialecticStore::open(&db_path)?;
        let kg = create_knowledge_graph(&config.kg, &db_path)?;
        Self::assemble(config, store, dialectic_store, kg)
    }

    /// Build an in-memory context for tests: no file on disk, no network.
    pub fn new_in_memory(config: Config) -> Result<Self> {
        let store = AgentStore::open_in_memory()?;
        let dialectic_store = DialecticStore::open_in_memory()?;
        let kg: Arc<dyn KnowledgeGraph> =
            Arc::new(sentinel_kg::sqlite::SqliteKnowledgeGraph::open_in_memory()?);
        Self::assemble(config, store, dialectic_store, kg)
    }

    fn assemble(
        config: Config,
        store: AgentStore,
        dialectic_store: DialecticStore,
        kg: Arc<dyn KnowledgeGraph>,
    ) -> Result<Self> {
        let embedder = create_embedder(&config.collab)?;
        let collaborator = create_dialectic_collaborator(&config.collab)?;
        let signing_secret = load_or_generate_secret();

        Ok(Self {
            config,
            store,
            dialectic_store,
            sessions: SessionStore::new(),
            locks: AgentLockMap::new(),
            kg,
            embedder,
            collaborator,
            signing_secret,
            recent_reviewers: Mutex::new(VecDeque::new()),
            llm_assisted_sessions: Mutex::new(HashSet::new()),
            open_dialectic_sessions: AtomicUsize::new(0),
            started_at: Instant::now(),
        })
    }

    pub fn signing_secret(&self) -> &[u8] {
        &self.signing_secret
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Record that `reviewer` has just been assigned a session, so the
    /// next pool selection can exclude it for `reviewer_pool_window` draws.
    pub fn note_reviewer_assigned(&self, reviewer: Uuid) {
        let window = self.config.dialectic.reviewer_pool_window;
        let mut recent = self.recent_reviewers.lock();
        recent.push_back(reviewer);
        while recent.len() > window {
            recent.pop_front();
        }
    }

    pub fn was_recently_reviewer(&self, candidate: Uuid) -> bool {
        self.recent_reviewers.lock().iter().any(|u| *u == candidate)
    }

    pub fn mark_llm_assisted(&self, session_id: Uuid) {
        self.llm_assisted_sessions.lock().insert(session_id);
    }

    pub fn is_llm_assisted(&self, session_id: Uuid) -> bool {
        self.llm_assisted_sessions.lock().contains(&session_id)
    }

    pub fn note_session_opened(&self) {
        self.open_dialectic_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_session_closed(&self) {
        self.open_dialectic_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn open_dialectic_session_count(&self) -> usize {
        self.open_dialectic_sessions.load(Ordering::Relaxed)
    }
}

fn load_or_generate_secret() -> Vec<u8> {
    if let Ok(hex_secret) = std::env::var(DIALECTIC_SECRET_ENV) {
        if let Ok(bytes) = hex::decode(hex_secret.trim()) {
            if !bytes.is_empty() {
                return bytes;
            }
        }
        tracing::warn!(
            "{DIALECTIC_SECRET_ENV} is set but not valid hex; generating an ephemeral secret instead"
        );
    }
    let mut bytes = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
