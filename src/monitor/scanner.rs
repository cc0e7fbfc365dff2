//! Initial pass over the PDFs already in a folder.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::path::is_pdf;
use super::pipeline::FilePipeline;
use super::stripper::FileOutcome;

/// Processes existing PDFs with bounded parallelism.
///
/// Not recursive. Scanned files bypass the dedup gate; they have not been
/// seen by this session before.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    pipeline: FilePipeline,
    concurrency: usize,
}

impl DirectoryScanner {
    pub fn new(pipeline: FilePipeline, concurrency: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
        }
    }

    /// Process every PDF directly inside `dir` and wait for all of them.
    pub async fn scan(&self, dir: &Path) {
        let activity = self.pipeline.activity();
        let owned = dir.to_path_buf();
        let files = match tokio::task::spawn_blocking(move || list_pdfs(&owned)).await {
            Ok(Ok(listing)) => {
                for e in &listing.errors {
                    activity.log(&format!("Error scanning folder: {e}"));
                }
                listing.files
            }
            Ok(Err(e)) => {
                activity.log(&format!("Error scanning folder: {e}"));
                return;
            }
            Err(e) => {
                activity.log(&format!("Error scanning folder: {e}"));
                return;
            }
        };

        if files.is_empty() {
            activity.log("No existing PDF files found.");
            return;
        }
        activity.log(&format!("Scanning {} existing PDF files...", files.len()));

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for path in files {
            let pipeline = self.pipeline.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                pipeline.process(&path).await
            });
        }

        let mut summary = ScanSummary::default();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(outcome) => summary.record(outcome.as_ref()),
                Err(e) => {
                    tracing::error!("[scanner] worker failed: {e}");
                    summary.not_ready += 1;
                }
            }
        }

        crate::log_event!(
            "scanner",
            "complete",
            "{} unblocked, {} clean, {} failed, {} skipped, {} not ready",
            summary.unblocked,
            summary.already_clean,
            summary.failed,
            summary.skipped,
            summary.not_ready
        );
        activity.log("Initial scan complete.");
    }
}

/// Result of listing one folder.
#[derive(Debug, Default)]
struct Listing {
    files: Vec<PathBuf>,
    /// Entries that could not be read; the rest of the listing is still used.
    errors: Vec<io::Error>,
}

/// PDFs directly inside `dir`, sorted by path. Blocking.
fn list_pdfs(dir: &Path) -> io::Result<Listing> {
    let mut listing = Listing::default();
    for entry in std::fs::read_dir(dir)? {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if is_pdf(&path) && path.is_file() {
                    listing.files.push(path);
                }
            }
            Err(e) => listing.errors.push(e),
        }
    }
    listing.files.sort();
    Ok(listing)
}

/// Tally of one scan, for diagnostics.
#[derive(Debug, Default)]
struct ScanSummary {
    unblocked: usize,
    already_clean: usize,
    failed: usize,
    skipped: usize,
    not_ready: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: Option<&FileOutcome>) {
        match outcome {
            Some(FileOutcome::Unblocked) => self.unblocked += 1,
            Some(FileOutcome::AlreadyClean) => self.already_clean += 1,
            Some(FileOutcome::AccessDenied | FileOutcome::Failed { .. }) => self.failed += 1,
            Some(FileOutcome::Skipped) => self.skipped += 1,
            None => self.not_ready += 1,
        }
    }
}
