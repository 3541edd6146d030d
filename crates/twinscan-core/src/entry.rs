//! Index entry types.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::path::PathParts;

/// BLAKE3 content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Create a new Digest from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a lower-case hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64 character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Whether an entry is a regular file or a directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Check if this is a directory.
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }

    /// Check if this is a regular file.
    pub fn is_file(self) -> bool {
        self == EntryKind::File
    }
}

/// One record per filesystem path seen by a scan.
///
/// Identity fields are public and fixed at construction. The digest, the
/// directory counters and the duplicate flag are only changed through
/// [`TreeIndex`](crate::TreeIndex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique key of the entry.
    pub path: PathBuf,

    /// File or directory.
    pub kind: EntryKind,

    /// Final path component.
    pub name: CompactString,

    /// Containing directory, absent for top-level relative paths.
    pub parent_path: Option<PathBuf>,

    /// Final component of the containing directory.
    pub parent_name: CompactString,

    /// Byte length for files; platform-reported entry size for directories.
    pub size: u64,

    /// Lower-case extension including the dot; empty for directories.
    pub suffix: CompactString,

    /// Last modification time, when the platform reports one.
    pub modified: Option<DateTime<Utc>>,

    pub(crate) digest: Option<Digest>,
    pub(crate) direct_file_count: u64,
    pub(crate) total_file_count: u64,
    pub(crate) resolved_child_count: u64,
    pub(crate) failed_child_count: u64,
    pub(crate) is_duplicate: bool,
}

impl Entry {
    /// Create a file entry with its prefix fingerprint.
    pub fn new_file(path: impl Into<PathBuf>, size: u64, digest: Digest) -> Self {
        let mut entry = Self::bare(path.into(), EntryKind::File, size);
        entry.digest = Some(digest);
        entry
    }

    /// Create a directory entry; its digest stays unset until aggregation.
    pub fn new_directory(path: impl Into<PathBuf>, size: u64) -> Self {
        let mut entry = Self::bare(path.into(), EntryKind::Directory, size);
        entry.suffix = CompactString::default();
        entry
    }

    /// Attach a modification time.
    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    fn bare(path: PathBuf, kind: EntryKind, size: u64) -> Self {
        let parts = PathParts::from_path(&path);
        Self {
            path,
            kind,
            name: parts.name,
            parent_path: parts.parent_path,
            parent_name: parts.parent_name,
            size,
            suffix: parts.suffix,
            modified: None,
            digest: None,
            direct_file_count: 0,
            total_file_count: 0,
            resolved_child_count: 0,
            failed_child_count: 0,
            is_duplicate: false,
        }
    }

    /// Key of this entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content fingerprint, unset for unresolved directories.
    pub fn digest(&self) -> Option<Digest> {
        self.digest
    }

    /// Immediate file children (directories only).
    pub fn direct_file_count(&self) -> u64 {
        self.direct_file_count
    }

    /// Files anywhere below this directory.
    pub fn total_file_count(&self) -> u64 {
        self.total_file_count
    }

    /// Files below this directory whose resolution has been accounted for.
    pub fn resolved_child_count(&self) -> u64 {
        self.resolved_child_count
    }

    /// Children the scan saw but could not index (directories only).
    ///
    /// A directory with failures can never get a digest, and neither can its ancestors.
    pub fn failed_child_count(&self) -> u64 {
        self.failed_child_count
    }

    /// Whether the last classification put this entry in a duplicate group.
    pub fn is_duplicate(&self) -> bool {
        self.is_duplicate
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub(crate) fn clear_aggregates(&mut self) {
        self.digest = None;
        self.direct_file_count = 0;
        self.total_file_count = 0;
        self.resolved_child_count = 0;
    }
}
