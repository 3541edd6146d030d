//! JWalk-based scanner that classifies and fingerprints every path into a [`TreeIndex`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;

use twinscan_core::{
    ContentFingerprinter, Entry, EntryKind, ScanConfig, ScanError, ScanWarning, TreeIndex,
    WarningKind,
};

use crate::classifier::PathClassifier;
use crate::progress::{ProgressCounters, ScanProgress};

/// How often (in files) a progress update is broadcast.
const PROGRESS_INTERVAL: u64 = 1000;

/// Summary of one ingestion run.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    /// File entries inserted or overwritten.
    pub files_indexed: u64,
    /// Directory entries inserted or overwritten.
    pub dirs_indexed: u64,
    /// Prefix bytes read while fingerprinting.
    pub bytes_fingerprinted: u64,
    /// Stale entries removed (only with `prune_stale`).
    pub pruned: usize,
    /// Directories holding a child that could not be indexed.
    ///
    /// Their failure count is recorded in the index, so they and their
    /// ancestors stay without a digest.
    pub incomplete_dirs: usize,
    /// Paths skipped, with the reason.
    pub warnings: Vec<ScanWarning>,
    /// Wall time of the run.
    pub scan_duration: Duration,
}

impl ScanOutcome {
    /// Check if any path was skipped.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Entries written into the index by this run.
    pub fn entries_indexed(&self) -> u64 {
        self.files_indexed + self.dirs_indexed
    }
}

/// Parallel scanner using jwalk for enumeration and a bounded rayon pool for fingerprinting.
pub struct JwalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan `config.root` and insert every classified path into `index`.
    ///
    /// Existing entries at the same paths are overwritten. A path that cannot
    /// be classified or fingerprinted is skipped and reported in
    /// [`ScanOutcome::warnings`]; only a failure on the root itself aborts.
    pub fn scan(&self, config: &ScanConfig, index: &mut TreeIndex) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        let classifier = PathClassifier::new(config.follow_symlinks);
        let fingerprinter = ContentFingerprinter::new(config.prefix_bytes);
        let counters = ProgressCounters::new();

        let root_info = classifier.classify(&root)?;
        if root_info.kind == EntryKind::File {
            let (digest, read) = fingerprinter.fingerprint_file(&root)?;
            counters.record_file(read);
            index.insert(Entry::new_file(&root, root_info.size, digest).with_modified(root_info.modified));
            tracing::debug!(root = %root.display(), "scanned single file");

            return Ok(ScanOutcome {
                root,
                files_indexed: 1,
                dirs_indexed: 0,
                bytes_fingerprinted: read,
                pruned: 0,
                incomplete_dirs: 0,
                warnings: Vec::new(),
                scan_duration: start.elapsed(),
            });
        }

        let ignore = build_ignore_set(&config.ignore_patterns)?;
        let mut warnings = Vec::new();
        let mut incomplete = Vec::new();
        let paths = self.enumerate(config, &root, ignore, &mut warnings, &mut incomplete);
        tracing::debug!(root = %root.display(), paths = paths.len(), "enumeration finished");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| ScanError::Other {
                message: format!("Failed to build fingerprinting pool: {e}"),
            })?;

        let results: Vec<Result<Entry, ScanWarning>> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.ingest_path(path, &classifier, &fingerprinter, &counters))
                .collect()
        });

        let mut seen = HashSet::with_capacity(results.len());
        let mut files_indexed = 0;
        let mut dirs_indexed = 0;
        for result in results {
            match result {
                Ok(entry) => {
                    match entry.kind {
                        EntryKind::File => files_indexed += 1,
                        EntryKind::Directory => dirs_indexed += 1,
                    }
                    seen.insert(entry.path.clone());
                    index.insert(entry);
                }
                Err(warning) => {
                    if warning.kind.leaves_parent_incomplete() {
                        if let Some(parent) = warning.path.parent() {
                            incomplete.push(parent.to_path_buf());
                        }
                    }
                    warnings.push(warning);
                }
            }
        }

        let mut incomplete_dirs = HashSet::new();
        for dir in incomplete {
            if !index.is_directory(&dir) {
                continue;
            }
            index.record_failure(&dir).map_err(|e| ScanError::Other {
                message: e.to_string(),
            })?;
            incomplete_dirs.insert(dir);
        }

        let pruned = if config.prune_stale {
            index.prune_under(&root, &seen)
        } else {
            0
        };

        let scan_duration = start.elapsed();
        tracing::debug!(
            files = files_indexed,
            dirs = dirs_indexed,
            skipped = warnings.len(),
            incomplete = incomplete_dirs.len(),
            pruned,
            elapsed_ms = scan_duration.as_millis() as u64,
            "scan finished"
        );

        Ok(ScanOutcome {
            root,
            files_indexed,
            dirs_indexed,
            bytes_fingerprinted: counters.bytes(),
            pruned,
            incomplete_dirs: incomplete_dirs.len(),
            warnings,
            scan_duration,
        })
    }

    /// Enumerate every path under `root`, including `root` itself.
    ///
    /// Directories that lost a child to a walk error, or whose listing failed,
    /// are pushed onto `incomplete`.
    fn enumerate(
        &self,
        config: &ScanConfig,
        root: &Path,
        ignore: GlobSet,
        warnings: &mut Vec<ScanWarning>,
        incomplete: &mut Vec<PathBuf>,
    ) -> Vec<PathBuf> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        // Filtering inside read_dir prunes whole subtrees of ignored directories
        let filter_config = config.clone();
        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .min_depth(0)
            .process_read_dir(move |depth, _path, _state, children| {
                // The root itself arrives with no depth and is never filtered
                if depth.is_none() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => {
                        let name = entry.file_name().to_string_lossy();
                        !filter_config.should_skip_hidden(&name) && !ignore.is_match(&*name)
                    }
                    Err(_) => true,
                });
            });

        let mut paths = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::debug!(path = %path.display(), error = %err, "walk error");
                    if err.loop_ancestor().is_none() {
                        if let Some(parent) = path.parent() {
                            incomplete.push(parent.to_path_buf());
                        }
                    }
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            let path = entry.path();
            if !config.follow_symlinks && entry.file_type().is_symlink() {
                tracing::debug!(path = %path.display(), "skipping symlink");
                warnings.push(ScanWarning::symlink_skipped(&path));
                continue;
            }
            if let Some(err) = &entry.read_children_error {
                let error = match err.io_error() {
                    Some(io) => ScanError::io(&path, std::io::Error::new(io.kind(), io.to_string())),
                    None => ScanError::Other {
                        message: err.to_string(),
                    },
                };
                tracing::debug!(path = %path.display(), %error, "directory listing failed");
                warnings.push(ScanWarning::from_error(&path, &error));
                incomplete.push(path.clone());
            }
            paths.push(path);
        }
        paths
    }

    /// Classify one path and fingerprint it when it is a file.
    fn ingest_path(
        &self,
        path: &Path,
        classifier: &PathClassifier,
        fingerprinter: &ContentFingerprinter,
        counters: &ProgressCounters,
    ) -> Result<Entry, ScanWarning> {
        let skip = |error: ScanError| {
            counters.record_error();
            tracing::debug!(path = %path.display(), %error, "skipping path");
            ScanWarning::from_error(path, &error)
        };

        let info = classifier.classify(path).map_err(skip)?;

        match info.kind {
            EntryKind::Directory => {
                counters.record_dir();
                Ok(Entry::new_directory(path, info.size).with_modified(info.modified))
            }
            EntryKind::File => {
                let (digest, read) = fingerprinter.fingerprint_file(path).map_err(skip)?;
                let count = counters.record_file(read);
                if count % PROGRESS_INTERVAL == 0 {
                    let _ = self.progress_tx.send(counters.snapshot(path));
                }
                Ok(Entry::new_file(path, info.size, digest).with_modified(info.modified))
            }
        }
    }
}

impl Default for JwalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
            message: format!("invalid ignore pattern {pattern:?}: {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ScanError::InvalidConfig {
        message: e.to_string(),
    })
}
