//! Error types for scanning, indexing and snapshot operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while scanning a path.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found (never existed, or vanished during the scan).
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path is neither a regular file nor a directory.
    #[error("Unsupported file type: {path}")]
    UnsupportedType { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::UnsupportedType { path } => Some(path),
            Self::InvalidConfig { .. } | Self::Other { .. } => None,
        }
    }
}

/// Errors raised when updating aggregate fields through the index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// No entry is stored under this path.
    #[error("No entry for path: {path}")]
    UnknownPath { path: PathBuf },

    /// The entry exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// Errors raised by snapshot import and export.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error while reading or writing the snapshot file.
    #[error("Snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV layer failure not tied to a single row.
    #[error("Snapshot CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("Malformed snapshot: missing column `{column}`")]
    MissingColumn { column: String },

    /// A single row could not be parsed.
    #[error("Malformed snapshot row at line {line}: {message}")]
    MalformedRow { line: u64, message: String },
}

/// Errors in user-supplied configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A category suffix is not of the form `.ext` in lower case.
    #[error("Invalid suffix {suffix:?} in {category} table: {reason}")]
    InvalidSuffix {
        category: String,
        suffix: String,
        reason: &'static str,
    },

    /// Settings could not be read or parsed.
    #[error("Invalid settings: {message}")]
    Invalid { message: String },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Path disappeared between enumeration and classification.
    Vanished,
    /// Error reading file contents or directory listing.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// Symbolic link was not followed.
    SymlinkSkipped,
    /// Neither a regular file nor a directory.
    Unsupported,
}

impl WarningKind {
    /// Whether the warned path still belongs to its directory's contents.
    ///
    /// Such a path was seen but never indexed, so the containing directory
    /// cannot be summarized. Vanished paths, unfollowed links and special
    /// files are not content.
    pub fn leaves_parent_incomplete(self) -> bool {
        matches!(self, Self::PermissionDenied | Self::ReadError | Self::MetadataError)
    }
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a skipped symbolic link.
    pub fn symlink_skipped(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Symbolic link not followed: {}", path.display()),
            path,
            kind: WarningKind::SymlinkSkipped,
        }
    }

    /// Convert a per-path scan error into a warning.
    pub fn from_error(path: impl Into<PathBuf>, error: &ScanError) -> Self {
        let kind = match error {
            ScanError::PermissionDenied { .. } => WarningKind::PermissionDenied,
            ScanError::NotFound { .. } => WarningKind::Vanished,
            ScanError::UnsupportedType { .. } => WarningKind::Unsupported,
            ScanError::Io { .. } | ScanError::InvalidConfig { .. } | ScanError::Other { .. } => {
                WarningKind::ReadError
            }
        };
        Self::new(path, error.to_string(), kind)
    }
}
