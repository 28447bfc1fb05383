//! Error types shared across the scan, move, restore and history modules.
//!
//! Cancellation is deliberately not represented here: a cancelled operation
//! returns [`crate::progress::Completion::Cancelled`] instead of an error.
//! Per-file failures during a move or restore are accumulated into the
//! operation's error list and never surface through this type.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors that can abort a scan, move, restore or history operation.
#[derive(Debug)]
pub enum SortError {
    /// The caller supplied input that is rejected before any filesystem
    /// mutation (non-existent directory, empty group selection, unknown
    /// operation id).
    InvalidInput { reason: String },
    /// The scanned directory itself could not be read.
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a destination folder for a batch.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the history file.
    HistoryWriteFailed { source: std::io::Error },
    /// Failed to read the history file.
    HistoryReadFailed { source: std::io::Error },
    /// History file exists but does not parse as a batch list.
    InvalidHistoryFormat { reason: String },
    /// Failed to write a report export file.
    ReportWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration could not be loaded or compiled.
    Config(ConfigError),
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { reason } => write!(f, "Invalid input: {}", reason),
            Self::DirectoryRead { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::HistoryWriteFailed { source } => {
                write!(f, "Failed to write history file: {}", source)
            }
            Self::HistoryReadFailed { source } => {
                write!(f, "Failed to read history file: {}", source)
            }
            Self::InvalidHistoryFormat { reason } => {
                write!(f, "Invalid history file format: {}", reason)
            }
            Self::ReportWriteFailed { path, source } => {
                write!(f, "Failed to write report {}: {}", path.display(), source)
            }
            Self::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SortError {}

impl From<ConfigError> for SortError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Result type for all sizesort operations.
pub type SortResult<T> = Result<T, SortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = SortError::InvalidInput {
            reason: "empty selection".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid input: empty selection");
    }

    #[test]
    fn test_directory_read_preserves_os_message() {
        let err = SortError::DirectoryRead {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/missing"));
        assert!(msg.contains("no such directory"));
    }
}
