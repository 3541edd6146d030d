//! File system scanning engine for twinscan.
//!
//! This crate walks a directory tree with jwalk, classifies every path from
//! its metadata and fingerprints every regular file on a bounded rayon pool,
//! inserting the results into a [`TreeIndex`].
//!
//! # Overview
//!
//! - **Parallel traversal** via jwalk/rayon
//! - **Prefix fingerprints** via BLAKE3 over the first `prefix_bytes` of each file
//! - **Progress updates** via broadcast channels
//! - **Partial results**: unreadable or vanished paths become warnings, not failures
//!
//! # Example
//!
//! ```rust,no_run
//! use twinscan_scan::{JwalkScanner, ScanConfig, TreeIndex};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let mut index = TreeIndex::new();
//! let outcome = JwalkScanner::new().scan(&config, &mut index).unwrap();
//!
//! println!("Indexed {} files", outcome.files_indexed);
//! println!("Skipped {} paths", outcome.warnings.len());
//! ```

mod classifier;
mod progress;
mod scanner;

pub use classifier::{PathClassifier, PathInfo};
pub use progress::ScanProgress;
pub use scanner::{JwalkScanner, ScanOutcome};

// Re-export core types for convenience
pub use twinscan_core::{
    Entry, EntryKind, ScanConfig, ScanError, ScanWarning, TreeIndex, WarningKind,
};
