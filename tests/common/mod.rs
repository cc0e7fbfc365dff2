//! Shared fixtures for monitor integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use preview_unblock::monitor::ZoneIdentifier;
use preview_unblock::{MonitorObserver, StatusReport, WatchConfig};

/// Observer that keeps everything it is told.
#[derive(Default)]
pub struct Recorder {
    lines: Mutex<Vec<String>>,
    statuses: Mutex<Vec<StatusReport>>,
}

impl MonitorObserver for Recorder {
    fn on_log(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn on_status_change(&self, status: &StatusReport) {
        self.statuses.lock().unwrap().push(*status);
    }
}

impl Recorder {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<StatusReport> {
        self.statuses.lock().unwrap().clone()
    }

    /// Number of lines that end with `suffix` (timestamps vary).
    pub fn count_ending(&self, suffix: &str) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.ends_with(suffix))
            .count()
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains(needle))
    }
}

/// Fast timings so tests do not sit in readiness retries.
pub fn fast_config() -> WatchConfig {
    WatchConfig {
        ready_delay_ms: 50,
        ..WatchConfig::default()
    }
}

/// Write a PDF and its Zone.Identifier marker.
pub fn write_blocked_pdf(dir: &Path, name: &str) -> PathBuf {
    let file = dir.join(name);
    write_marker(&file);
    std::fs::write(&file, b"%PDF-1.7\n").unwrap();
    file
}

pub fn write_marker(file: &Path) {
    std::fs::write(
        ZoneIdentifier::marker_path(file),
        "[ZoneTransfer]\r\nZoneId=3\r\n",
    )
    .unwrap();
}

pub fn write_clean_pdf(dir: &Path, name: &str) -> PathBuf {
    let file = dir.join(name);
    std::fs::write(&file, b"%PDF-1.7\n").unwrap();
    file
}

pub fn has_marker(file: &Path) -> bool {
    ZoneIdentifier::marker_path(file).exists()
}

/// Poll `cond` until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
