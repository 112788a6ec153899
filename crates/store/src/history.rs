//! Bounded per-agent history ring (spec §3: "capped to a ring of N,
//! default 1000").

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use sentinel_domain::types::Verdict;
use serde::{Deserialize, Serialize};

/// One recorded update: the post-step dynamics scalars plus the verdict
/// that update produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub e: f64,
    pub i: f64,
    pub s: f64,
    pub v: f64,
    pub coherence: Option<f64>,
    pub risk: f64,
    pub verdict: Verdict,
    pub timestamp: DateTime<Utc>,
}

/// A fixed-capacity FIFO of `HistoryEntry`. Appending past capacity drops
/// the oldest entry; older entries remain on disk (the durable store keeps
/// the full record) but are no longer kept hot in this ring (spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRing {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.min(256)),
        }
    }

    /// Append an entry, enforcing strictly non-decreasing timestamps (spec
    /// §3 invariant). Callers are expected to supply `Utc::now()` at call
    /// time; a clock that runs backward is treated as a caller bug, not
    /// silently corrected, since ordering must be externally observable.
    pub fn push(&mut self, entry: HistoryEntry) {
        if let Some(last) = self.entries.back() {
            debug_assert!(
                entry.timestamp >= last.timestamp,
                "history timestamps must be non-decreasing"
            );
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            e: 0.5,
            i: 0.5,
            s: 0.0,
            v: 0.0,
            coherence: None,
            risk: 0.1,
            verdict: Verdict::Proceed,
            timestamp: ts,
        }
    }

    #[test]
    fn push_past_capacity_drops_oldest() {
        let mut ring = HistoryRing::new(3);
        let base = Utc::now();
        for i in 0..5 {
            ring.push(entry(base + chrono::Duration::seconds(i)));
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.recent(10).len(), 3);
    }

    #[test]
    fn recent_limits_to_requested_count() {
        let mut ring = HistoryRing::new(10);
        let base = Utc::now();
        for i in 0..5 {
            ring.push(entry(base + chrono::Duration::seconds(i)));
        }
        assert_eq!(ring.recent(2).len(), 2);
    }

    #[test]
    fn empty_ring_has_no_last() {
        let ring = HistoryRing::new(10);
        assert!(ring.last().is_none());
        assert!(ring.is_empty());
    }
}
