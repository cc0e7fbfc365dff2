//! Strips the "downloaded from the internet" marker from PDFs in a watched folder.
//!
//! The [`Monitor`] owns the whole lifecycle: validate the folder, unblock the
//! PDFs already there, then keep unblocking new ones as they arrive. The
//! presentation layer plugs in through [`MonitorObserver`].

pub mod config;
pub mod logging;
pub mod monitor;

pub use config::{LoggingConfig, Settings, WatchConfig};
pub use monitor::{
    FileOutcome, Monitor, MonitorObserver, StartError, StatsSnapshot, StatusReport,
};
