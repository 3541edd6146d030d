//! Analysis algorithms for twinscan.
//!
//! This crate turns a scanned [`TreeIndex`] into duplicate reports:
//!
//! - **Directory aggregation** - Give every directory a digest derived from
//!   the digests of everything below it
//! - **Duplicate classification** - Flag entries sharing digest, size and kind
//! - **Views** - Filtered, sorted listings for reports
//!
//! # Example
//!
//! ```rust,no_run
//! use twinscan_analyze::{DirectoryAggregator, DuplicateClassifier, DuplicateFilter, duplicates};
//! use twinscan_core::CategoryTables;
//! use twinscan_scan::{JwalkScanner, ScanConfig, TreeIndex};
//!
//! let mut index = TreeIndex::new();
//! JwalkScanner::new().scan(&ScanConfig::new("/path/to/scan"), &mut index).unwrap();
//!
//! DirectoryAggregator::new().aggregate(&mut index).unwrap();
//! let report = DuplicateClassifier::new().classify(&mut index);
//! println!("Found {} duplicate groups", report.group_count());
//!
//! for entry in duplicates(&index, DuplicateFilter::Files, &CategoryTables::default()) {
//!     println!("{}", entry.path.display());
//! }
//! ```

mod aggregate;
mod duplicates;
mod views;

pub use aggregate::{AggregationReport, DirectoryAggregator};
pub use duplicates::{DuplicateClassifier, DuplicateGroup, DuplicateReport};
pub use views::{DuplicateFilter, ReportRow, duplicates, find_category, to_rows};

// Re-export core types
pub use twinscan_core::{CategoryTables, Digest, Entry, EntryKind, MediaCategory, TreeIndex};
