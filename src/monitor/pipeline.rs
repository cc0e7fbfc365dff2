//! Per-file processing shared by the initial scan and live events.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::activity::{ActivityLog, StatusReport};
use super::readiness::ReadinessWaiter;
use super::stripper::{FileOutcome, MarkerStripper};

/// Wait-for-ready, strip, then report.
///
/// Cheap to clone; every clone shares the same counters and activity log.
#[derive(Debug, Clone)]
pub struct FilePipeline {
    stripper: MarkerStripper,
    waiter: ReadinessWaiter,
    activity: Arc<ActivityLog>,
    running: Arc<AtomicBool>,
}

impl FilePipeline {
    pub fn new(
        stripper: MarkerStripper,
        waiter: ReadinessWaiter,
        activity: Arc<ActivityLog>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            stripper,
            waiter,
            activity,
            running,
        }
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.activity
    }

    /// Run `path` through the whole pipeline.
    ///
    /// Returns `None` if the file never became ready.
    pub async fn process(&self, path: &Path) -> Option<FileOutcome> {
        if !self.wait_ready(path).await {
            return None;
        }
        Some(self.strip(path))
    }

    pub async fn wait_ready(&self, path: &Path) -> bool {
        let ready = self.waiter.await_ready(path).await;
        if !ready {
            tracing::warn!("[pipeline] not ready, skipping {}", path.display());
        }
        ready
    }

    /// Strip without waiting, then log the outcome and publish counters.
    pub fn strip(&self, path: &Path) -> FileOutcome {
        let outcome = self.stripper.strip(path);
        if let Some(message) = outcome.describe(path) {
            self.activity.log(&message);
        }
        if matches!(outcome, FileOutcome::Unblocked) || outcome.is_failure() {
            self.publish_status();
        }
        outcome
    }

    pub fn publish_status(&self) {
        self.activity.status_with(|| self.status());
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::new(
            self.stripper.stats().snapshot(),
            self.running.load(Ordering::SeqCst),
        )
    }
}
