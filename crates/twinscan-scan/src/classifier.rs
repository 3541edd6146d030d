//! Metadata-based path classification.

use std::fs::Metadata;
use std::path::Path;

use chrono::{DateTime, Utc};
use twinscan_core::{EntryKind, PathParts, ScanError};

/// Everything the scanner needs to know about a path before fingerprinting.
#[derive(Debug, Clone)]
pub struct PathInfo {
    /// Name, parent, parent name and suffix.
    pub parts: PathParts,
    /// Byte length for files; reported entry size for directories.
    pub size: u64,
    /// Regular file or directory, from a metadata query.
    pub kind: EntryKind,
    /// Last modification time, when available.
    pub modified: Option<DateTime<Utc>>,
}

/// Classifies existing paths by querying filesystem metadata.
///
/// The kind is never guessed from the path string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathClassifier {
    follow_symlinks: bool,
}

impl PathClassifier {
    /// Create a classifier. With `follow_symlinks` a link is classified as its target.
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    /// Classify `path`.
    ///
    /// Fails with [`ScanError::NotFound`] when the path vanished since it was
    /// enumerated and with [`ScanError::UnsupportedType`] for anything that is
    /// neither a regular file nor a directory.
    pub fn classify(&self, path: &Path) -> Result<PathInfo, ScanError> {
        let metadata = self.metadata(path).map_err(|e| ScanError::io(path, e))?;
        let file_type = metadata.file_type();

        let kind = if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            return Err(ScanError::UnsupportedType {
                path: path.to_path_buf(),
            });
        };

        let mut parts = PathParts::from_path(path);
        if kind.is_dir() {
            parts.suffix.clear();
        }

        Ok(PathInfo {
            parts,
            size: metadata.len(),
            kind,
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    fn metadata(&self, path: &Path) -> std::io::Result<Metadata> {
        if self.follow_symlinks {
            std::fs::metadata(path)
        } else {
            std::fs::symlink_metadata(path)
        }
    }
}
