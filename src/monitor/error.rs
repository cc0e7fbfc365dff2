//! Error types for the folder monitor.

use std::path::PathBuf;
use thiserror::Error;

/// Why a candidate folder was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Path is not absolute: {path}")]
    NotAbsolute { path: PathBuf },

    #[error("Path contains a parent-directory segment: {path}")]
    Traversal { path: PathBuf },

    #[error("Folder does not exist: {path}")]
    DirectoryMissing { path: PathBuf },
}

/// Errors returned by [`crate::Monitor::start`] and
/// [`crate::Monitor::change_folder`].
///
/// Nothing is changed when one of these is returned.
#[derive(Error, Debug)]
pub enum StartError {
    #[error("Invalid folder path: {path}")]
    InvalidPath { path: PathBuf },

    #[error("Folder does not exist: {path}")]
    DirectoryMissing { path: PathBuf },

    #[error("Failed to watch {path}: {reason}")]
    Watch { path: PathBuf, reason: String },
}

impl From<ValidationError> for StartError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::NotAbsolute { path } | ValidationError::Traversal { path } => {
                StartError::InvalidPath { path }
            }
            ValidationError::DirectoryMissing { path } => StartError::DirectoryMissing { path },
        }
    }
}

/// Errors from the notification subscription.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },
}

impl From<notify::Error> for MonitorError {
    fn from(e: notify::Error) -> Self {
        MonitorError::InitFailed {
            reason: e.to_string(),
        }
    }
}

impl From<MonitorError> for StartError {
    fn from(e: MonitorError) -> Self {
        match e {
            MonitorError::PathWatchFailed { path, reason } => StartError::Watch { path, reason },
            MonitorError::InitFailed { reason } => StartError::Watch {
                path: PathBuf::new(),
                reason,
            },
        }
    }
}
