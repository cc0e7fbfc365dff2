//! Folder validation and PDF path predicates.

use std::path::{Component, Path, PathBuf};

use super::error::ValidationError;

/// Confirms a candidate folder is safe to monitor.
///
/// A folder is accepted only if it is absolute, has no `..` segment and
/// resolves to an existing directory. Validation has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathValidator;

impl PathValidator {
    pub fn validate(path: &Path) -> bool {
        Self::check(path).is_ok()
    }

    /// Like [`validate`](Self::validate) but says which rule failed.
    pub fn check(path: &Path) -> Result<(), ValidationError> {
        if !path.is_absolute() {
            return Err(ValidationError::NotAbsolute {
                path: path.to_path_buf(),
            });
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(ValidationError::Traversal {
                path: path.to_path_buf(),
            });
        }
        if !path.is_dir() {
            return Err(ValidationError::DirectoryMissing {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// True if the file name ends in `.pdf`, ignoring case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// File name for activity lines, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The user's Downloads folder, or their home directory if it is unknown.
pub fn default_folder() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")).filter(|p| p.is_dir()))
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
