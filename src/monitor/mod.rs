//! Folder monitor that unblocks downloaded PDFs.
//!
//! # Architecture
//!
//! ```text
//! Monitor::start(dir)
//!   - PathValidator
//!   - DirectoryScanner (existing PDFs, bounded parallelism)
//!   - notify::RecommendedWatcher -> mpsc -> Dispatcher
//!         |
//!      DedupGate (one admission per path per window)
//!         |
//!      FilePipeline: ReadinessWaiter -> MarkerStripper
//!         |
//!      StatsCounter + ActivityLog -> MonitorObserver
//! ```

mod activity;
mod dedup;
mod error;
mod events;
mod path;
mod pipeline;
mod readiness;
mod scanner;
mod session;
mod stats;
mod stripper;

pub use activity::{ActivityLog, MonitorObserver, StatusReport};
pub use dedup::DedupGate;
pub use error::{MonitorError, StartError, ValidationError};
pub use events::{EventRoute, route_event};
pub use path::{PathValidator, default_folder, display_name, is_pdf};
pub use pipeline::FilePipeline;
pub use readiness::ReadinessWaiter;
pub use scanner::DirectoryScanner;
pub use session::Monitor;
pub use stats::{StatsCounter, StatsSnapshot};
pub use stripper::{FileOutcome, MarkerRemover, MarkerStripper, ZoneIdentifier};
