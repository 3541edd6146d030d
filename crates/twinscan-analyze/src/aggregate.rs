//! Bottom-up directory digest aggregation.
//!
//! A directory's digest is the BLAKE3 hash of its children's digests,
//! concatenated in child-name order. Aggregation runs in level-synchronous
//! passes: every directory whose whole subtree is resolved gets its digest in
//! the current pass, then its parent's resolved count grows by the number of
//! files below it. Directories in one pass are independent, so their digests
//! are computed in parallel; all index writes happen on the calling thread.
//!
//! A directory with no children at all gets [`twinscan_core::empty_digest`]. A directory
//! holding only empty subdirectories is not empty: its digest combines the
//! children's empty digests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use twinscan_core::{Digest, Entry, IndexError, TreeIndex, fingerprint_blob};

/// Result of an aggregation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Number of resolution passes executed.
    pub passes: usize,
    /// Directories that received a digest.
    pub resolved: usize,
    /// Directories left without a digest, sorted by path.
    pub unresolved: Vec<PathBuf>,
}

impl AggregationReport {
    /// Check if every directory received a digest.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Parent/child structure of the directories in an index.
struct Layout {
    /// Children of every directory, files and directories alike.
    children: HashMap<PathBuf, Vec<PathBuf>>,
    /// All directories, deepest first.
    deepest_first: Vec<PathBuf>,
}

impl Layout {
    fn build(index: &TreeIndex) -> Self {
        let mut children: HashMap<PathBuf, Vec<PathBuf>> = index
            .directories()
            .map(|d| (d.path.clone(), Vec::new()))
            .collect();

        for entry in index.iter() {
            if let Some(parent) = entry.parent_path.as_ref() {
                if let Some(siblings) = children.get_mut(parent) {
                    siblings.push(entry.path.clone());
                }
            }
        }

        let deepest_first = children
            .keys()
            .cloned()
            .sorted_by(|a, b| {
                b.components()
                    .count()
                    .cmp(&a.components().count())
                    .then_with(|| a.cmp(b))
            })
            .collect();

        Self {
            children,
            deepest_first,
        }
    }

    fn children_of(&self, dir: &Path) -> &[PathBuf] {
        self.children.get(dir).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Assigns every directory a digest summarizing its recursive content.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryAggregator;

impl DirectoryAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Recompute counts and digests of every directory in `index`.
    ///
    /// Previous directory aggregates are discarded first, so running this
    /// twice on an unchanged index gives identical results. Directories that
    /// can never resolve (a file below them has no digest, or the scan could
    /// not index one of their children) keep an unset digest and are listed
    /// in [`AggregationReport::unresolved`].
    pub fn aggregate(&self, index: &mut TreeIndex) -> Result<AggregationReport, IndexError> {
        index.clear_directory_aggregates();
        let layout = Layout::build(index);
        let mut pending_dirs = initialize_counts(index, &layout)?;

        let mut unresolved: HashSet<PathBuf> = layout.deepest_first.iter().cloned().collect();
        let mut report = AggregationReport::default();

        loop {
            let view = &*index;
            let ready: Vec<PathBuf> = unresolved
                .iter()
                .filter(|dir| is_ready(view, dir, &pending_dirs))
                .cloned()
                .collect();
            if ready.is_empty() {
                break;
            }

            // (files, directories) resolved below each parent during this pass
            let increments: DashMap<PathBuf, (u64, usize)> = DashMap::new();
            let digests: Vec<(PathBuf, Digest)> = ready
                .par_iter()
                .map(|dir| {
                    let digest = combine_children(view, layout.children_of(dir));
                    if let Some(entry) = view.get(dir) {
                        if let Some(parent) = entry.parent_path.as_ref() {
                            if view.is_directory(parent) {
                                let mut slot = increments.entry(parent.clone()).or_insert((0, 0));
                                slot.0 += entry.total_file_count();
                                slot.1 += 1;
                            }
                        }
                    }
                    (dir.clone(), digest)
                })
                .collect();

            for (dir, digest) in digests {
                index.set_directory_digest(&dir, digest)?;
                unresolved.remove(&dir);
            }
            for (parent, (files, dirs)) in increments {
                index.add_resolved(&parent, files)?;
                if let Some(pending) = pending_dirs.get_mut(&parent) {
                    *pending = pending.saturating_sub(dirs);
                }
            }

            report.passes += 1;
            report.resolved += ready.len();
            tracing::debug!(pass = report.passes, resolved = ready.len(), "aggregation pass");
        }

        report.unresolved = unresolved.into_iter().sorted().collect();
        if !report.unresolved.is_empty() {
            tracing::warn!(
                count = report.unresolved.len(),
                "directories left without digest"
            );
        }

        Ok(report)
    }
}

/// Set direct and total file counts bottom-up and seed resolved counts.
///
/// Returns the number of child directories of every directory.
fn initialize_counts(
    index: &mut TreeIndex,
    layout: &Layout,
) -> Result<HashMap<PathBuf, usize>, IndexError> {
    let mut totals: HashMap<&Path, u64> = HashMap::with_capacity(layout.deepest_first.len());
    let mut child_dirs: HashMap<PathBuf, usize> = HashMap::with_capacity(layout.deepest_first.len());

    for dir in &layout.deepest_first {
        let mut direct = 0u64;
        let mut resolved = 0u64;
        let mut nested = 0u64;
        let mut dirs = 0usize;

        for child in layout.children_of(dir) {
            let Some(entry) = index.get(child) else {
                continue;
            };
            if entry.is_file() {
                direct += 1;
                if entry.digest().is_some() {
                    resolved += 1;
                }
            } else {
                dirs += 1;
                nested += totals.get(child.as_path()).copied().unwrap_or_default();
            }
        }

        // Children the scan could not index count as files that never resolve
        let failed = index
            .get(dir)
            .map(Entry::failed_child_count)
            .unwrap_or_default();
        let total = direct + failed + nested;
        index.set_directory_counts(dir, direct, total, resolved)?;
        totals.insert(dir.as_path(), total);
        child_dirs.insert(dir.clone(), dirs);
    }

    Ok(child_dirs)
}

/// A directory is ready when every file and every subdirectory below it resolved.
fn is_ready(index: &TreeIndex, dir: &Path, pending_dirs: &HashMap<PathBuf, usize>) -> bool {
    let subdirs_done = pending_dirs.get(dir).copied().unwrap_or_default() == 0;
    subdirs_done
        && index
            .get(dir)
            .is_some_and(|e| e.digest().is_none() && e.resolved_child_count() == e.total_file_count())
}

/// Hash the children's digests concatenated in name order.
fn combine_children(index: &TreeIndex, children: &[PathBuf]) -> Digest {
    let blob: Vec<u8> = children
        .iter()
        .filter_map(|p| index.get(p))
        .sorted_by(|a: &&Entry, b: &&Entry| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)))
        .filter_map(Entry::digest)
        .flat_map(|d| *d.as_bytes())
        .collect();
    fingerprint_blob(&blob)
}
