//! Gossip counters
//!
//! Observability only: nothing in the protocol reads these back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals shared by the disseminator, receive handler and scheduler
#[derive(Debug, Default)]
pub struct GossipStats {
    rounds: AtomicU64,
    rounds_skipped: AtomicU64,
    pushes_delivered: AtomicU64,
    pushes_failed: AtomicU64,
    pushes_timed_out: AtomicU64,
    merges_adopted: AtomicU64,
    merges_ignored: AtomicU64,
    local_writes: AtomicU64,
}

impl GossipStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_round(&self) {
        self.rounds_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_push_delivered(&self) {
        self.pushes_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_push_failed(&self) {
        self.pushes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_push_timed_out(&self) {
        self.pushes_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merge(&self, adopted: bool) {
        if adopted {
            self.merges_adopted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.merges_ignored.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_local_write(&self) {
        self.local_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rounds: self.rounds.load(Ordering::Relaxed),
            rounds_skipped: self.rounds_skipped.load(Ordering::Relaxed),
            pushes_delivered: self.pushes_delivered.load(Ordering::Relaxed),
            pushes_failed: self.pushes_failed.load(Ordering::Relaxed),
            pushes_timed_out: self.pushes_timed_out.load(Ordering::Relaxed),
            merges_adopted: self.merges_adopted.load(Ordering::Relaxed),
            merges_ignored: self.merges_ignored.load(Ordering::Relaxed),
            local_writes: self.local_writes.load(Ordering::Relaxed),
        }
    }
}

/// Gossip statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub rounds: u64,
    pub rounds_skipped: u64,
    pub pushes_delivered: u64,
    pub pushes_failed: u64,
    pub pushes_timed_out: u64,
    pub merges_adopted: u64,
    pub merges_ignored: u64,
    pub local_writes: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rounds={} skipped={} delivered={} failed={} timed_out={} adopted={} ignored={} writes={}",
            self.rounds,
            self.rounds_skipped,
            self.pushes_delivered,
            self.pushes_failed,
            self.pushes_timed_out,
            self.merges_adopted,
            self.merges_ignored,
            self.local_writes
        )
    }
}
