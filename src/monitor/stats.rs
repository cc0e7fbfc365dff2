//! Processed/failed counters shared by all workers of a session.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe file counters.
///
/// Both counters only grow, except for [`reset`](Self::reset) at session start.
#[derive(Debug, Default)]
pub struct StatsCounter {
    processed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub failed: u64,
}

impl StatsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.processed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}

impl StatsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.processed == 0 && self.failed == 0
    }
}
