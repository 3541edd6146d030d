//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files fingerprinted so far.
    pub files_fingerprinted: u64,
    /// Number of directories classified so far.
    pub dirs_found: u64,
    /// Total prefix bytes read so far.
    pub bytes_read: u64,
    /// Path most recently processed.
    pub current_path: PathBuf,
    /// Number of paths skipped with a warning.
    pub errors_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_fingerprinted: 0,
            dirs_found: 0,
            bytes_read: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_fingerprinted as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total items processed (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_fingerprinted + self.dirs_found
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters shared by the fingerprinting workers.
#[derive(Debug)]
pub(crate) struct ProgressCounters {
    start_time: Instant,
    files: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
    errors: AtomicU64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            files: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Record a fingerprinted file; returns the running file count.
    pub fn record_file(&self, bytes: u64) -> u64 {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.files.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, current_path: &Path) -> ScanProgress {
        ScanProgress {
            files_fingerprinted: self.files.load(Ordering::Relaxed),
            dirs_found: self.dirs.load(Ordering::Relaxed),
            bytes_read: self.bytes.load(Ordering::Relaxed),
            current_path: current_path.to_path_buf(),
            errors_count: self.errors.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = ProgressCounters::new();
        assert_eq!(counters.record_file(100), 1);
        assert_eq!(counters.record_file(50), 2);
        counters.record_dir();
        counters.record_error();

        let progress = counters.snapshot(Path::new("/x"));
        assert_eq!(progress.files_fingerprinted, 2);
        assert_eq!(progress.bytes_read, 150);
        assert_eq!(progress.total_items(), 3);
        assert_eq!(progress.errors_count, 1);
        assert_eq!(progress.current_path, PathBuf::from("/x"));
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        assert_eq!(ScanProgress::new().files_per_second(), 0.0);
    }
}
