//! Removal of the "downloaded from the internet" marker.
//!
//! Windows records the origin zone of a downloaded file in an alternate data
//! stream named `Zone.Identifier`. Deleting that stream is all it takes to
//! stop the preview pane from refusing the file. The file content is never
//! opened for writing.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::path::{display_name, is_pdf};
use super::stats::StatsCounter;

/// Result of one processing attempt on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The marker was present and has been removed.
    Unblocked,
    /// No marker to remove. The normal steady state.
    AlreadyClean,
    /// The marker exists but we are not allowed to delete it.
    AccessDenied,
    /// Any other removal failure.
    Failed { reason: String },
    /// Not a PDF, or the file disappeared before we got to it.
    Skipped,
}

impl FileOutcome {
    /// Counts toward the failed total.
    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::AccessDenied | FileOutcome::Failed { .. })
    }

    /// Activity message for this outcome, without timestamp.
    ///
    /// `Skipped` files are not worth a line in the activity log.
    pub fn describe(&self, path: &Path) -> Option<String> {
        let name = display_name(path);
        match self {
            FileOutcome::Unblocked => Some(format!("✓ Unblocked: {name}")),
            FileOutcome::AlreadyClean => Some(format!("→ Already unblocked: {name}")),
            FileOutcome::AccessDenied => Some(format!("✗ Access denied: {name}")),
            FileOutcome::Failed { reason } => Some(format!("✗ Failed: {name} ({reason})")),
            FileOutcome::Skipped => None,
        }
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Unblocked => write!(f, "unblocked"),
            FileOutcome::AlreadyClean => write!(f, "already clean"),
            FileOutcome::AccessDenied => write!(f, "access denied"),
            FileOutcome::Failed { reason } => write!(f, "failed ({reason})"),
            FileOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Something that can delete a file's origin marker.
///
/// Implementations report a missing marker as [`io::ErrorKind::NotFound`].
pub trait MarkerRemover: Send + Sync {
    /// Remover name for logging.
    fn name(&self) -> &str;

    /// Delete the marker attached to `file`.
    fn remove_marker(&self, file: &Path) -> io::Result<()>;
}

/// The `Zone.Identifier` marker.
///
/// On NTFS `<file>:Zone.Identifier` addresses the alternate data stream.
/// Elsewhere the same name is an ordinary sibling file, which is what these
/// streams turn into when downloads are copied off Windows (WSL, Samba).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneIdentifier;

impl ZoneIdentifier {
    pub const STREAM: &'static str = "Zone.Identifier";

    /// Path that addresses the marker of `file`.
    pub fn marker_path(file: &Path) -> PathBuf {
        let mut marker = OsString::from(file.as_os_str());
        marker.push(":");
        marker.push(Self::STREAM);
        PathBuf::from(marker)
    }
}

impl MarkerRemover for ZoneIdentifier {
    fn name(&self) -> &str {
        Self::STREAM
    }

    fn remove_marker(&self, file: &Path) -> io::Result<()> {
        std::fs::remove_file(Self::marker_path(file))
    }
}

/// Strips markers from single files and classifies the result.
///
/// Never panics or returns an error: every failure becomes a [`FileOutcome`].
/// Safe to call concurrently on different paths.
#[derive(Clone)]
pub struct MarkerStripper {
    remover: Arc<dyn MarkerRemover>,
    stats: Arc<StatsCounter>,
}

impl fmt::Debug for MarkerStripper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerStripper")
            .field("remover", &self.remover.name())
            .field("stats", &self.stats)
            .finish()
    }
}

impl MarkerStripper {
    /// Stripper for the platform `Zone.Identifier` marker.
    pub fn new(stats: Arc<StatsCounter>) -> Self {
        Self::with_remover(Arc::new(ZoneIdentifier), stats)
    }

    pub fn with_remover(remover: Arc<dyn MarkerRemover>, stats: Arc<StatsCounter>) -> Self {
        Self { remover, stats }
    }

    pub fn stats(&self) -> &Arc<StatsCounter> {
        &self.stats
    }

    /// Remove the marker from `path`, updating counters.
    pub fn strip(&self, path: &Path) -> FileOutcome {
        if !is_pdf(path) {
            crate::debug_event!("stripper", "not a pdf", "{}", path.display());
            return FileOutcome::Skipped;
        }
        // Time may have passed since the path was observed
        if !path.is_file() {
            crate::debug_event!("stripper", "vanished", "{}", path.display());
            return FileOutcome::Skipped;
        }

        let outcome = match self.remover.remove_marker(path) {
            Ok(()) => FileOutcome::Unblocked,
            Err(e) => match e.kind() {
                io::ErrorKind::NotFound => FileOutcome::AlreadyClean,
                io::ErrorKind::PermissionDenied => FileOutcome::AccessDenied,
                _ => FileOutcome::Failed {
                    reason: e.to_string(),
                },
            },
        };

        match &outcome {
            FileOutcome::Unblocked => self.stats.increment_processed(),
            o if o.is_failure() => {
                tracing::warn!("[stripper] {}: {o}", path.display());
                self.stats.increment_failed();
            }
            _ => {}
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Remover that always fails with the given kind.
    struct FailingRemover(io::ErrorKind);

    impl MarkerRemover for FailingRemover {
        fn name(&self) -> &str {
            "failing"
        }

        fn remove_marker(&self, _file: &Path) -> io::Result<()> {
            Err(io::Error::new(self.0, "simulated"))
        }
    }

    /// Remover that must never be reached.
    struct PanickingRemover;

    impl MarkerRemover for PanickingRemover {
        fn name(&self) -> &str {
            "panicking"
        }

        fn remove_marker(&self, file: &Path) -> io::Result<()> {
            panic!("filesystem touched for {}", file.display());
        }
    }

    fn blocked_pdf(dir: &TempDir, name: &str) -> PathBuf {
        let file = dir.path().join(name);
        std::fs::write(&file, b"%PDF-1.7").unwrap();
        std::fs::write(
            ZoneIdentifier::marker_path(&file),
            "[ZoneTransfer]\r\nZoneId=3\r\n",
        )
        .unwrap();
        file
    }

    #[test]
    fn test_marker_path() {
        let marker = ZoneIdentifier::marker_path(Path::new("/d/a.pdf"));
        assert_eq!(marker, PathBuf::from("/d/a.pdf:Zone.Identifier"));
    }

    #[test]
    fn test_unblocks_marked_file_once() {
        let dir = TempDir::new().unwrap();
        let file = blocked_pdf(&dir, "a.pdf");
        let stripper = MarkerStripper::new(Arc::new(StatsCounter::new()));

        assert_eq!(stripper.strip(&file), FileOutcome::Unblocked);
        assert!(!ZoneIdentifier::marker_path(&file).exists());
        assert!(file.exists(), "content file must be left alone");
        assert_eq!(stripper.stats().snapshot().processed, 1);

        // Second call finds nothing to do
        assert_eq!(stripper.strip(&file), FileOutcome::AlreadyClean);
        assert_eq!(stripper.stats().snapshot().processed, 1);
    }

    #[test]
    fn test_clean_file_leaves_counters_alone() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("b.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        let stripper = MarkerStripper::new(Arc::new(StatsCounter::new()));

        assert_eq!(stripper.strip(&file), FileOutcome::AlreadyClean);
        let snap = stripper.stats().snapshot();
        assert_eq!((snap.processed, snap.failed), (0, 0));
    }

    #[test]
    fn test_non_pdf_is_skipped_without_touching_fs() {
        let stripper = MarkerStripper::with_remover(
            Arc::new(PanickingRemover),
            Arc::new(StatsCounter::new()),
        );
        for name in ["/d/c.txt", "/d/archive.pdf.zip", "/d/noext"] {
            assert_eq!(stripper.strip(Path::new(name)), FileOutcome::Skipped);
        }
        assert_eq!(stripper.stats().snapshot().processed, 0);
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let stripper = MarkerStripper::with_remover(
            Arc::new(PanickingRemover),
            Arc::new(StatsCounter::new()),
        );
        assert_eq!(
            stripper.strip(&dir.path().join("gone.PDF")),
            FileOutcome::Skipped
        );
    }

    #[test]
    fn test_permission_denied_counts_as_failed() {
        let dir = TempDir::new().unwrap();
        let file = blocked_pdf(&dir, "locked.pdf");
        let stripper = MarkerStripper::with_remover(
            Arc::new(FailingRemover(io::ErrorKind::PermissionDenied)),
            Arc::new(StatsCounter::new()),
        );

        assert_eq!(stripper.strip(&file), FileOutcome::AccessDenied);
        let snap = stripper.stats().snapshot();
        assert_eq!((snap.processed, snap.failed), (0, 1));
    }

    #[test]
    fn test_other_errors_are_failed_with_reason() {
        let dir = TempDir::new().unwrap();
        let file = blocked_pdf(&dir, "odd.pdf");
        let stripper = MarkerStripper::with_remover(
            Arc::new(FailingRemover(io::ErrorKind::Other)),
            Arc::new(StatsCounter::new()),
        );

        let outcome = stripper.strip(&file);
        assert!(matches!(outcome, FileOutcome::Failed { ref reason } if reason.contains("simulated")));
        assert_eq!(stripper.stats().snapshot().failed, 1);
    }

    #[test]
    fn test_describe_lines() {
        let path = Path::new("/d/a.pdf");
        assert_eq!(
            FileOutcome::Unblocked.describe(path).as_deref(),
            Some("✓ Unblocked: a.pdf")
        );
        assert_eq!(
            FileOutcome::AlreadyClean.describe(path).as_deref(),
            Some("→ Already unblocked: a.pdf")
        );
        assert_eq!(
            FileOutcome::Failed {
                reason: "disk gone".to_string()
            }
            .describe(path)
            .as_deref(),
            Some("✗ Failed: a.pdf (disk gone)")
        );
        assert_eq!(FileOutcome::Skipped.describe(path), None);
    }
}
