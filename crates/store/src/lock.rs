//! Per-agent write lock with liveness-checked stale-lock reclamation and
//! exponential backoff (spec §4.6).
//!
//! Grounded on the teacher's `SessionLockMap` (`Semaphore(1)` per key),
//! extended with a side record of who holds the lock and since when, so a
//! contending acquirer can tell an abandoned lock from one that is merely
//! busy and reclaim the former instead of waiting out its full retry
//! budget.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sentinel_domain::config::StoreConfig;
use sentinel_domain::error::{Error, Result};
use sentinel_domain::trace::TraceEvent;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

struct LockRecord {
    owner: String,
    acquired_at: Instant,
}

struct Entry {
    sem: Arc<Semaphore>,
    record: Option<LockRecord>,
}

impl Entry {
    fn fresh() -> Self {
        Self {
            sem: Arc::new(Semaphore::new(1)),
            record: None,
        }
    }
}

/// Owns one advisory lock per agent UUID. A single process instance is
/// the unit of ownership (spec Non-goals: "no distributed consensus —
/// single-writer-per-agent is sufficient"); staleness is therefore
/// detected purely by elapsed time against `lock_stale_after_secs`, not by
/// an external process-liveness probe.
#[derive(Default)]
pub struct AgentLockMap {
    entries: Mutex<HashMap<Uuid, Arc<Mutex<Entry>>>>,
}

/// RAII guard: the agent lock releases automatically when this is
/// dropped, on every exit path (spec §4.6, §5 cancellation guarantee),
/// including a panic unwind.
pub struct AgentLockGuard {
    _permit: OwnedSemaphorePermit,
}

impl AgentLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_for(&self, uuid: Uuid) -> Arc<Mutex<Entry>> {
        self.entries
            .lock()
            .entry(uuid)
            .or_insert_with(|| Arc::new(Mutex::new(Entry::fresh())))
            .clone()
    }

    /// Acquire the lock for `uuid`, owned by `owner` (an opaque
    /// process/instance identifier used only for diagnostics). Retries
    /// with backoff `lock_backoff_base_secs * 2^attempt` up to
    /// `lock_max_retries` times; a lock held past `lock_stale_after_secs`
    /// with no successful contender is reclaimed rather than waited out.
    pub async fn acquire(&self, uuid: Uuid, owner: &str, cfg: &StoreConfig) -> Result<AgentLockGuard> {
        let entry = self.entry_for(uuid);

        if let Some(guard) = self.try_take(&entry, uuid, owner) {
            return Ok(guard);
        }

        for attempt in 0..cfg.lock_max_retries {
            TraceEvent::LockContended {
                uuid: uuid.to_string(),
                attempt,
            }
            .emit();

            let backoff = cfg.lock_backoff_base_secs * 2f64.powi(attempt as i32);
            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;

            if let Some(guard) = self.try_take(&entry, uuid, owner) {
                return Ok(guard);
            }

            if self.reclaim_if_stale(&entry, uuid, cfg) {
                if let Some(guard) = self.try_take(&entry, uuid, owner) {
                    return Ok(guard);
                }
            }
        }

        let retry_after_ms =
            (cfg.lock_backoff_base_secs * 2f64.powi(cfg.lock_max_retries as i32) * 1000.0) as u64;
        Err(Error::Busy { retry_after_ms })
    }

    fn try_take(&self, entry: &Arc<Mutex<Entry>>, uuid: Uuid, owner: &str) -> Option<AgentLockGuard> {
        let sem = entry.lock().sem.clone();
        match sem.try_acquire_owned() {
            Ok(permit) => {
                entry.lock().record = Some(LockRecord {
                    owner: owner.to_string(),
                    acquired_at: Instant::now(),
                });
                Some(AgentLockGuard { _permit: permit })
            }
            Err(_) => None,
        }
    }

    /// If the current holder's record is older than
    /// `lock_stale_after_secs`, replace the semaphore with a fresh one so
    /// the next `try_take` succeeds immediately, and record the
    /// reclamation. Returns whether a reclamation happened.
    fn reclaim_if_stale(&self, entry: &Arc<Mutex<Entry>>, uuid: Uuid, cfg: &StoreConfig) -> bool {
        let mut locked = entry.lock();
        let stale = locked
            .record
            .as_ref()
            .map(|r| r.acquired_at.elapsed() > Duration::from_secs(cfg.lock_stale_after_secs))
            .unwrap_or(false);
        if !stale {
            return false;
        }
        let previous_owner = locked.record.as_ref().map(|r| r.owner.clone()).unwrap_or_default();
        locked.sem = Arc::new(Semaphore::new(1));
        locked.record = None;
        drop(locked);

        TraceEvent::LockReclaimed {
            uuid: uuid.to_string(),
            previous_owner,
        }
        .emit();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> StoreConfig {
        let mut c = StoreConfig::default();
        c.lock_backoff_base_secs = 0.001;
        c.lock_max_retries = 3;
        c.lock_stale_after_secs = 0;
        c
    }

    #[tokio::test]
    async fn uncontended_acquire_succeeds() {
        let locks = AgentLockMap::new();
        let uuid = Uuid::new_v4();
        let _guard = locks.acquire(uuid, "proc-a", &cfg()).await.unwrap();
    }

    #[tokio::test]
    async fn sequential_reacquire_after_drop() {
        let locks = AgentLockMap::new();
        let uuid = Uuid::new_v4();
        let g1 = locks.acquire(uuid, "proc-a", &cfg()).await.unwrap();
        drop(g1);
        let _g2 = locks.acquire(uuid, "proc-a", &cfg()).await.unwrap();
    }

    #[tokio::test]
    async fn different_agents_do_not_contend() {
        let locks = AgentLockMap::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let _ga = locks.acquire(a, "proc-a", &cfg()).await.unwrap();
        let _gb = locks.acquire(b, "proc-a", &cfg()).await.unwrap();
    }

    #[tokio::test]
    async fn stale_lock_is_reclaimed_instead_of_exhausting_retries() {
        let locks = AgentLockMap::new();
        let uuid = Uuid::new_v4();
        let g1 = locks.acquire(uuid, "proc-a", &cfg()).await.unwrap();
        // proc-a "crashed": never drops g1, but with stale_after_secs=0
        // the next contender should reclaim on its first retry rather
        // than exhausting the backoff budget.
        let result = locks.acquire(uuid, "proc-b", &cfg()).await;
        assert!(result.is_ok());
        drop(g1);
    }

    #[tokio::test]
    async fn exhausted_retries_return_busy() {
        let locks = AgentLockMap::new();
        let uuid = Uuid::new_v4();
        let mut c = cfg();
        c.lock_stale_after_secs = 3600;
        let _g1 = locks.acquire(uuid, "proc-a", &c).await.unwrap();
        let result = locks.acquire(uuid, "proc-b", &c).await;
        assert!(matches!(result, Err(Error::Busy { .. })));
    }
}
