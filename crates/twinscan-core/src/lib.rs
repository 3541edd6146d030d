//! Core types for twinscan.
//!
//! This crate provides the data model shared by the scanner and the analysis
//! passes: index entries and their digests, the [`TreeIndex`] that owns them,
//! prefix fingerprinting, media category tables, scan configuration and the
//! CSV snapshot codec.

mod category;
mod config;
mod entry;
mod error;
mod fingerprint;
mod index;
mod path;
pub mod snapshot;

pub use category::{CategoryTables, MediaCategory};
pub use config::{ScanConfig, ScanConfigBuilder};
pub use entry::{Digest, Entry, EntryKind};
pub use error::{ConfigError, IndexError, ScanError, ScanWarning, SnapshotError, WarningKind};
pub use fingerprint::{ContentFingerprinter, DEFAULT_PREFIX_BYTES, empty_digest, fingerprint_blob};
pub use index::TreeIndex;
pub use path::{PathParts, extract_suffix};
pub use snapshot::ImportReport;
