//! Start/stop lifecycle of a folder watch.
//!
//! ```text
//!            start(dir)                    change_folder(dir)
//! Stopped ──────────────> Running ─────────────────────────┐
//!    ^                      │  ^                           │
//!    └──────── stop() ──────┘  └── stop() + start(dir) ────┘
//! ```
//!
//! While running, a single dispatcher task drains the notify channel and
//! spawns one short-lived worker per admitted path. Stopping cancels the
//! dispatcher and drops the OS subscription; workers that already reached the
//! strip step finish and are still counted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;

use super::activity::{ActivityLog, MonitorObserver, StatusReport};
use super::dedup::DedupGate;
use super::error::{MonitorError, StartError};
use super::events::{EventRoute, route_event};
use super::path::{PathValidator, default_folder};
use super::pipeline::FilePipeline;
use super::readiness::ReadinessWaiter;
use super::scanner::DirectoryScanner;
use super::stats::{StatsCounter, StatsSnapshot};
use super::stripper::{MarkerRemover, MarkerStripper, ZoneIdentifier};

/// Watches one folder at a time and unblocks the PDFs that land in it.
///
/// All methods take `&self`; start, stop and folder changes are serialised
/// internally, so a `Monitor` can be shared behind an `Arc`.
pub struct Monitor {
    config: WatchConfig,
    stats: Arc<StatsCounter>,
    activity: Arc<ActivityLog>,
    dedup: DedupGate,
    pipeline: FilePipeline,
    running: Arc<AtomicBool>,
    folder: parking_lot::Mutex<PathBuf>,
    session: Mutex<Option<ActiveSession>>,
}

/// Everything owned by a running session.
struct ActiveSession {
    dir: PathBuf,
    cancel: CancellationToken,
    /// Dropping this releases the OS subscription.
    _watcher: notify::RecommendedWatcher,
    _dispatcher: JoinHandle<()>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("folder", &*self.folder.lock())
            .field("running", &self.is_running())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl Monitor {
    /// Monitor that strips the platform `Zone.Identifier` marker.
    pub fn new(config: WatchConfig, observer: Arc<dyn MonitorObserver>) -> Self {
        Self::with_remover(config, observer, Arc::new(ZoneIdentifier))
    }

    pub fn with_remover(
        config: WatchConfig,
        observer: Arc<dyn MonitorObserver>,
        remover: Arc<dyn MarkerRemover>,
    ) -> Self {
        let stats = Arc::new(StatsCounter::new());
        let activity = Arc::new(ActivityLog::new(config.log_history, observer));
        let running = Arc::new(AtomicBool::new(false));
        let pipeline = FilePipeline::new(
            MarkerStripper::with_remover(remover, Arc::clone(&stats)),
            ReadinessWaiter::new(config.ready_retries, config.ready_delay()),
            Arc::clone(&activity),
            Arc::clone(&running),
        );

        Self {
            dedup: DedupGate::new(config.debounce_window()),
            config,
            stats,
            activity,
            pipeline,
            running,
            folder: parking_lot::Mutex::new(default_folder()),
            session: Mutex::new(None),
        }
    }

    /// Start watching `dir`.
    ///
    /// Validates first, then resets the counters, processes the PDFs already
    /// present and finally subscribes to changes. If a session is already
    /// running it is stopped first.
    pub async fn start(&self, dir: &Path) -> Result<(), StartError> {
        PathValidator::check(dir)?;

        let mut session = self.session.lock().await;
        if let Some(active) = session.take() {
            self.shutdown(active);
        }

        *self.folder.lock() = dir.to_path_buf();
        self.stats.reset();
        self.running.store(true, Ordering::SeqCst);
        self.activity.log("Started monitoring.");
        self.pipeline.publish_status();

        DirectoryScanner::new(self.pipeline.clone(), self.config.scan_concurrency)
            .scan(dir)
            .await;

        match self.subscribe(dir) {
            Ok(active) => {
                crate::log_event!("session", "watching", "{}", dir.display());
                *session = Some(active);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.activity.log(&format!("⚠️ Watcher error: {e}"));
                self.pipeline.publish_status();
                Err(e.into())
            }
        }
    }

    /// Stop watching. Does nothing if already stopped.
    ///
    /// Counters keep their values for display until the next start.
    pub async fn stop(&self) {
        let mut session = self.session.lock().await;
        if let Some(active) = session.take() {
            self.shutdown(active);
        }
    }

    /// Switch to `dir`.
    ///
    /// An invalid folder is rejected without touching the current session.
    /// When stopped this only records the folder for the next start.
    pub async fn change_folder(&self, dir: &Path) -> Result<(), StartError> {
        PathValidator::check(dir)?;
        if self.is_running() {
            self.start(dir).await
        } else {
            *self.folder.lock() = dir.to_path_buf();
            Ok(())
        }
    }

    /// Start on the currently selected folder.
    pub async fn start_selected(&self) -> Result<(), StartError> {
        let dir = self.folder();
        self.start(&dir).await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Folder that is being watched, or will be on the next start.
    pub fn folder(&self) -> PathBuf {
        self.folder.lock().clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn status(&self) -> StatusReport {
        self.pipeline.status()
    }

    /// Recent activity lines, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.activity.history()
    }

    fn shutdown(&self, active: ActiveSession) {
        self.running.store(false, Ordering::SeqCst);
        crate::log_event!("session", "stopping", "{}", active.dir.display());
        // Cancels the dispatcher and releases the subscription
        drop(active);
        self.dedup.clear();
        self.activity.log("Stopped monitoring.");
        self.pipeline.publish_status();
    }

    fn subscribe(&self, dir: &Path) -> Result<ActiveSession, MonitorError> {
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| MonitorError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher {
            dedup: self.dedup.clone(),
            pipeline: self.pipeline.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(dispatcher.run(rx));

        Ok(ActiveSession {
            dir: dir.to_path_buf(),
            cancel,
            _watcher: watcher,
            _dispatcher: handle,
        })
    }
}

/// Drains notify events for one session and fans them out to workers.
#[derive(Clone)]
struct Dispatcher {
    dedup: DedupGate,
    pipeline: FilePipeline,
    cancel: CancellationToken,
}

impl Dispatcher {
    async fn run(self, mut rx: mpsc::Receiver<notify::Result<Event>>) {
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                received = rx.recv() => match received {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => self.report_overflow(&e.to_string()),
                    None => break,
                },
            }
        }
        crate::debug_event!("dispatcher", "exited");
    }

    fn handle_event(&self, event: Event) {
        match route_event(&event) {
            EventRoute::Process(paths) => {
                for path in paths {
                    if !self.dedup.try_enter(&path) {
                        continue;
                    }
                    let worker = self.clone();
                    tokio::spawn(async move { worker.process(path).await });
                }
            }
            EventRoute::Overflow => self.report_overflow("event queue overflowed"),
            EventRoute::Ignore => {
                crate::debug_event!("dispatcher", "ignored", "{:?} {:?}", event.kind, event.paths);
            }
        }
    }

    async fn process(self, path: PathBuf) {
        if !self.pipeline.wait_ready(&path).await {
            return;
        }
        // Stopped while waiting: leave it for whichever session comes next
        if self.cancel.is_cancelled() {
            crate::debug_event!("dispatcher", "dropped after stop", "{}", path.display());
            return;
        }
        self.pipeline.strip(&path);
    }

    fn report_overflow(&self, detail: &str) {
        tracing::warn!("[dispatcher] watcher error: {detail}");
        let activity = self.pipeline.activity();
        activity.log(&format!("⚠️ Watcher error: {detail}"));
        activity.log("Some file events may have been missed. Consider monitoring a smaller folder.");
    }
}
