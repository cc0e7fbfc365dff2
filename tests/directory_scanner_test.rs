//! Initial-scan behaviour: completeness, parallelism cap and error handling.

mod common;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use common::*;
use preview_unblock::monitor::{
    ActivityLog, DirectoryScanner, FilePipeline, MarkerRemover, MarkerStripper, ReadinessWaiter,
    StatsCounter, ZoneIdentifier,
};
use tempfile::TempDir;

/// Real remover that also records how many calls overlap.
#[derive(Default)]
struct GaugedRemover {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl MarkerRemover for GaugedRemover {
    fn name(&self) -> &str {
        "gauged"
    }

    fn remove_marker(&self, file: &Path) -> io::Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        let result = ZoneIdentifier.remove_marker(file);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn build_scanner(
    remover: Arc<dyn MarkerRemover>,
    concurrency: usize,
) -> (DirectoryScanner, Arc<StatsCounter>, Arc<Recorder>) {
    let stats = Arc::new(StatsCounter::new());
    let recorder = Arc::new(Recorder::default());
    let pipeline = FilePipeline::new(
        MarkerStripper::with_remover(remover, Arc::clone(&stats)),
        ReadinessWaiter::new(3, Duration::from_millis(20)),
        Arc::new(ActivityLog::new(1_000, recorder.clone())),
        Arc::new(AtomicBool::new(true)),
    );
    (DirectoryScanner::new(pipeline, concurrency), stats, recorder)
}

fn outcome_lines(recorder: &Recorder) -> usize {
    recorder
        .lines()
        .iter()
        .filter(|l| {
            ["✓ Unblocked: ", "→ Already unblocked: ", "✗ Access denied: ", "✗ Failed: "]
                .iter()
                .any(|marker| l.contains(marker))
        })
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_every_file_completes_under_any_cap() {
    for cap in [1, 2, 4, 16] {
        let dir = TempDir::new().unwrap();
        for i in 0..6 {
            write_blocked_pdf(dir.path(), &format!("blocked-{i}.pdf"));
        }
        for i in 0..4 {
            write_clean_pdf(dir.path(), &format!("clean-{i}.PDF"));
        }

        let remover = Arc::new(GaugedRemover::default());
        let (scanner, stats, recorder) = build_scanner(remover.clone(), cap);
        scanner.scan(dir.path()).await;

        let snap = stats.snapshot();
        assert_eq!(snap.processed, 6, "cap {cap}");
        assert_eq!(snap.failed, 0, "cap {cap}");
        assert_eq!(remover.calls.load(Ordering::SeqCst), 10, "cap {cap}");
        assert_eq!(outcome_lines(&recorder), 10, "cap {cap}");
        assert!(
            remover.peak.load(Ordering::SeqCst) <= cap,
            "cap {cap} exceeded: {}",
            remover.peak.load(Ordering::SeqCst)
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_default_cap_runs_in_parallel() {
    let dir = TempDir::new().unwrap();
    for i in 0..12 {
        write_blocked_pdf(dir.path(), &format!("{i:02}.pdf"));
    }

    let remover = Arc::new(GaugedRemover::default());
    let (scanner, stats, _) = build_scanner(remover.clone(), 4);
    scanner.scan(dir.path()).await;

    assert_eq!(stats.snapshot().processed, 12);
    let peak = remover.peak.load(Ordering::SeqCst);
    assert!((1..=4).contains(&peak), "peak {peak}");
}

#[tokio::test]
async fn test_scan_is_not_recursive_and_ignores_other_types() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    let deep = write_blocked_pdf(&nested, "deep.pdf");
    // A directory that merely looks like a PDF
    std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();
    std::fs::write(dir.path().join("c.txt"), "x").unwrap();
    let top = write_blocked_pdf(dir.path(), "top.pdf");

    let (scanner, stats, recorder) = build_scanner(Arc::new(ZoneIdentifier), 4);
    scanner.scan(dir.path()).await;

    assert!(!has_marker(&top));
    assert!(has_marker(&deep));
    assert_eq!(stats.snapshot().processed, 1);
    assert_eq!(recorder.count_ending("] Scanning 1 existing PDF files..."), 1);
}

#[tokio::test]
async fn test_missing_folder_is_logged_not_fatal() {
    let dir = TempDir::new().unwrap();
    let gone = dir.path().join("removed");

    let (scanner, stats, recorder) = build_scanner(Arc::new(ZoneIdentifier), 4);
    scanner.scan(&gone).await;

    assert!(recorder.mentions("Error scanning folder: "));
    assert_eq!(stats.snapshot().processed, 0);
}
