//! User-facing activity log and status reporting.
//!
//! Workers run concurrently but the log is append-only and serial: every
//! line, and every status change, is emitted under one lock in the order the
//! lock was taken.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::stats::StatsSnapshot;

/// Callbacks the presentation layer implements.
///
/// Both callbacks run on worker threads with the activity lock held; they must
/// not call back into [`ActivityLog`] or [`crate::Monitor::history`].
pub trait MonitorObserver: Send + Sync {
    /// One timestamped activity line, e.g. `[2024-05-01 09:30:00] ✓ Unblocked: a.pdf`.
    fn on_log(&self, line: &str);

    /// Called after every counter change and every start/stop.
    fn on_status_change(&self, status: &StatusReport) {
        let _ = status;
    }
}

/// Counters plus running state, as shown in the status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusReport {
    pub processed: u64,
    pub failed: u64,
    pub running: bool,
}

impl StatusReport {
    pub fn new(stats: StatsSnapshot, running: bool) -> Self {
        Self {
            processed: stats.processed,
            failed: stats.failed,
            running,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.running, self.processed == 0 && self.failed == 0) {
            (true, _) => write!(
                f,
                "Monitoring active — {} unblocked, {} failed",
                self.processed, self.failed
            ),
            (false, false) => write!(
                f,
                "Monitoring stopped — {} unblocked, {} failed",
                self.processed, self.failed
            ),
            (false, true) => write!(f, "Ready to start monitoring"),
        }
    }
}

/// Serialised sink in front of a [`MonitorObserver`].
///
/// Keeps the most recent `capacity` lines so a late-attached view can catch up.
pub struct ActivityLog {
    history: Mutex<VecDeque<String>>,
    capacity: usize,
    observer: Arc<dyn MonitorObserver>,
}

impl fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityLog")
            .field("lines", &self.history.lock().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ActivityLog {
    pub fn new(capacity: usize, observer: Arc<dyn MonitorObserver>) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            observer,
        }
    }

    /// Timestamp `message` and append it.
    pub fn log(&self, message: &str) {
        let line = format!(
            "[{}] {message}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        crate::log_event!("activity", message);

        let mut history = self.history.lock();
        if self.capacity > 0 {
            while history.len() >= self.capacity {
                history.pop_front();
            }
            history.push_back(line.clone());
        }
        self.observer.on_log(&line);
    }

    pub fn status(&self, report: StatusReport) {
        self.status_with(|| report);
    }

    /// Build the report under the log lock, so reports reach the observer in
    /// the same order as the state they describe.
    pub fn status_with(&self, report: impl FnOnce() -> StatusReport) {
        let _guard = self.history.lock();
        let report = report();
        self.observer.on_status_change(&report);
    }

    /// Retained lines, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().iter().cloned().collect()
    }
}
