//! Suppression of duplicate change notifications.
//!
//! A single download usually produces a create event followed by one or more
//! modify events. The gate lets the first one through and swallows the rest
//! until the path's window expires.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Short-lived set of paths that are being (or were just) processed.
///
/// Each admitted path gets its own single-shot expiry task. Entries are
/// tagged with a ticket so an expiry scheduled before [`clear`](Self::clear)
/// never evicts a newer entry for the same path.
///
/// [`try_enter`](Self::try_enter) must be called from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct DedupGate {
    /// Pending paths: path -> ticket of the admission that owns the slot.
    pending: Arc<DashMap<PathBuf, u64>>,
    next_ticket: Arc<AtomicU64>,
    window: Duration,
}

impl Default for DedupGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl DedupGate {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_ticket: Arc::new(AtomicU64::new(0)),
            window,
        }
    }

    /// Admit `path` unless it is already inside its window.
    ///
    /// Returns true only for the caller that inserted the entry.
    pub fn try_enter(&self, path: &Path) -> bool {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        match self.pending.entry(path.to_path_buf()) {
            Entry::Occupied(_) => {
                crate::debug_event!("dedup", "suppressed", "{}", path.display());
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(ticket);
                self.schedule_expiry(path.to_path_buf(), ticket);
                true
            }
        }
    }

    fn schedule_expiry(&self, path: PathBuf, ticket: u64) {
        let pending = Arc::clone(&self.pending);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            pending.remove_if(&path, |_, owner| *owner == ticket);
        });
    }

    /// Forget every pending path. Outstanding expiries become no-ops.
    pub fn clear(&self) {
        self.pending.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
