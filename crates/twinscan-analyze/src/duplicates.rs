//! Duplicate classification over an aggregated index.
//!
//! Entries are grouped by the triple (digest, size, kind). Every group with
//! at least two members is a duplicate group and each member gets its
//! `is_duplicate` flag set; every other entry has the flag cleared. Entries
//! without a digest (unresolved directories, digest-less imports) never take
//! part in a group.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use twinscan_core::{Digest, Entry, EntryKind, TreeIndex};

/// A set of entries sharing digest, size and kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Digest shared by all members.
    pub digest: Digest,

    /// Size of each member in bytes.
    pub size: u64,

    /// Whether the members are files or directories.
    pub kind: EntryKind,

    /// Member paths, sorted.
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Get the number of members.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Bytes held by all but one member.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.paths.len().saturating_sub(1) as u64
    }
}

/// Results from duplicate classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Duplicate groups, ordered by digest then size then kind.
    pub groups: Vec<DuplicateGroup>,

    /// Entries that carried a digest and were considered.
    pub entries_analyzed: u64,

    /// Entries flagged as duplicates.
    pub duplicate_entries: u64,

    /// Bytes that could be reclaimed by keeping one file of every file group.
    ///
    /// Directory groups are left out since their files are already counted.
    pub wasted_file_bytes: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Number of duplicate groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Groups of a single kind.
    pub fn groups_of(&self, kind: EntryKind) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(move |g| g.kind == kind)
    }
}

/// Flags entries whose content appears more than once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateClassifier;

impl DuplicateClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// Group the index by (digest, size, kind) and set every entry's duplicate flag.
    ///
    /// Running this again on an unchanged index gives the same flags.
    pub fn classify(&self, index: &mut TreeIndex) -> DuplicateReport {
        let mut buckets: HashMap<(Digest, u64, EntryKind), Vec<PathBuf>> = HashMap::new();
        let mut entries_analyzed = 0u64;

        for entry in index.iter() {
            let Some(digest) = entry.digest() else {
                continue;
            };
            entries_analyzed += 1;
            buckets
                .entry((digest, entry.size, entry.kind))
                .or_default()
                .push(entry.path.clone());
        }

        let groups: Vec<DuplicateGroup> = buckets
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|((digest, size, kind), paths)| DuplicateGroup {
                digest,
                size,
                kind,
                paths: paths.into_iter().sorted().collect(),
            })
            .sorted_by(|a, b| {
                a.digest
                    .cmp(&b.digest)
                    .then(a.size.cmp(&b.size))
                    .then(a.kind.cmp(&b.kind))
            })
            .collect();

        let flagged: HashSet<PathBuf> = groups
            .iter()
            .flat_map(|g| g.paths.iter().cloned())
            .collect();
        index.mark_duplicates(&flagged);

        let wasted_file_bytes = groups
            .iter()
            .filter(|g| g.kind == EntryKind::File)
            .map(DuplicateGroup::wasted_bytes)
            .sum();

        tracing::debug!(
            groups = groups.len(),
            duplicates = flagged.len(),
            analyzed = entries_analyzed,
            "duplicate classification complete"
        );

        DuplicateReport {
            duplicate_entries: flagged.len() as u64,
            entries_analyzed,
            wasted_file_bytes,
            groups,
        }
    }
}

/// Entries flagged as duplicates, in the index's insertion order.
pub(crate) fn flagged(index: &TreeIndex) -> impl Iterator<Item = &Entry> {
    index.iter().filter(|e| e.is_duplicate())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn d(byte: u8) -> Digest {
        Digest::new([byte; 32])
    }

    fn flag(index: &TreeIndex, path: &str) -> bool {
        index.get(Path::new(path)).unwrap().is_duplicate()
    }

    #[test]
    fn test_identical_files_grouped() {
        let mut index: TreeIndex = [
            Entry::new_file("/r/a.txt", 5, d(1)),
            Entry::new_file("/r/b.txt", 5, d(1)),
            Entry::new_file("/r/c.txt", 5, d(1)),
            Entry::new_file("/r/other.txt", 5, d(2)),
        ]
        .into_iter()
        .collect();

        let report = DuplicateClassifier::new().classify(&mut index);

        assert_eq!(report.group_count(), 1);
        assert_eq!(report.groups[0].count(), 3);
        assert_eq!(report.groups[0].wasted_bytes(), 10);
        assert_eq!(report.duplicate_entries, 3);
        assert_eq!(report.entries_analyzed, 4);
        assert_eq!(report.wasted_file_bytes, 10);
        assert!(flag(&index, "/r/a.txt"));
        assert!(!flag(&index, "/r/other.txt"));
    }

    #[test]
    fn test_same_digest_different_size_not_grouped() {
        let mut index: TreeIndex = [
            Entry::new_file("/r/short", 4096, d(1)),
            Entry::new_file("/r/long", 8192, d(1)),
        ]
        .into_iter()
        .collect();

        let report = DuplicateClassifier::new().classify(&mut index);
        assert!(!report.has_duplicates());
        assert!(!flag(&index, "/r/short"));
    }

    #[test]
    fn test_file_and_directory_never_grouped() {
        let mut index: TreeIndex = [
            Entry::new_file("/r/f", 0, d(9)),
            Entry::new_directory("/r/d", 0),
        ]
        .into_iter()
        .collect();
        index.set_directory_digest(Path::new("/r/d"), d(9)).unwrap();

        let report = DuplicateClassifier::new().classify(&mut index);
        assert!(!report.has_duplicates());
    }

    #[test]
    fn test_unresolved_entries_ignored() {
        let mut index: TreeIndex = [
            Entry::new_directory("/r/x", 0),
            Entry::new_directory("/r/y", 0),
        ]
        .into_iter()
        .collect();

        let report = DuplicateClassifier::new().classify(&mut index);
        assert_eq!(report.entries_analyzed, 0);
        assert!(!flag(&index, "/r/x"));
    }

    #[test]
    fn test_flags_cleared_on_reclassify() {
        let mut index: TreeIndex = [
            Entry::new_file("/r/a", 1, d(1)),
            Entry::new_file("/r/b", 1, d(1)),
        ]
        .into_iter()
        .collect();
        let classifier = DuplicateClassifier::new();
        classifier.classify(&mut index);
        assert!(flag(&index, "/r/a"));

        index.insert(Entry::new_file("/r/b", 1, d(2)));
        let report = classifier.classify(&mut index);
        assert!(!report.has_duplicates());
        assert!(!flag(&index, "/r/a"));
        assert_eq!(flagged(&index).count(), 0);
    }

    #[test]
    fn test_groups_ordered_by_digest() {
        let mut index: TreeIndex = [
            Entry::new_file("/r/z1", 1, d(3)),
            Entry::new_file("/r/z2", 1, d(3)),
            Entry::new_file("/r/a1", 1, d(1)),
            Entry::new_file("/r/a2", 1, d(1)),
        ]
        .into_iter()
        .collect();

        let report = DuplicateClassifier::new().classify(&mut index);
        let digests: Vec<Digest> = report.groups.iter().map(|g| g.digest).collect();
        assert_eq!(digests, vec![d(1), d(3)]);
        assert_eq!(report.groups_of(EntryKind::Directory).count(), 0);
    }
}
