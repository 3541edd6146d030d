//! In-memory table of every scanned file and directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::entry::{Digest, Entry, EntryKind};
use crate::error::IndexError;

/// Owns all entries, keyed by path.
///
/// Entries are added by scans and snapshot imports. After insertion only the
/// directory aggregate fields and the duplicate flag change, and only through
/// the update methods below.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    entries: IndexMap<PathBuf, Entry>,
}

impl TreeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry, replacing any entry stored under the same path.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.path.clone(), entry)
    }

    /// Look up an entry by path.
    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Check if an entry exists for `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Check if `path` is stored as a directory.
    pub fn is_directory(&self, path: &Path) -> bool {
        self.get(path).is_some_and(Entry::is_dir)
    }

    /// Iterate over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Iterate over entries of one kind.
    pub fn of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &Entry> {
        self.entries.values().filter(move |e| e.kind == kind)
    }

    /// Iterate over file entries.
    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.of_kind(EntryKind::File)
    }

    /// Iterate over directory entries.
    pub fn directories(&self) -> impl Iterator<Item = &Entry> {
        self.of_kind(EntryKind::Directory)
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Remove entries strictly below `root` whose paths are not in `seen`.
    ///
    /// Returns the number of entries removed.
    pub fn prune_under(&mut self, root: &Path, seen: &HashSet<PathBuf>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|path, _| !(path.starts_with(root) && path != root) || seen.contains(path));
        before - self.entries.len()
    }

    /// Clear digest and counters of every directory before a fresh aggregation.
    pub fn clear_directory_aggregates(&mut self) {
        for entry in self.entries.values_mut().filter(|e| e.is_dir()) {
            entry.clear_aggregates();
        }
    }

    /// Set the file counts of a directory and seed its resolved count.
    pub fn set_directory_counts(
        &mut self,
        path: &Path,
        direct_file_count: u64,
        total_file_count: u64,
        resolved_child_count: u64,
    ) -> Result<(), IndexError> {
        let entry = self.directory_mut(path)?;
        entry.direct_file_count = direct_file_count;
        entry.total_file_count = total_file_count;
        entry.resolved_child_count = resolved_child_count;
        Ok(())
    }

    /// Account for `files` more resolved files below a directory.
    pub fn add_resolved(&mut self, path: &Path, files: u64) -> Result<u64, IndexError> {
        let entry = self.directory_mut(path)?;
        entry.resolved_child_count += files;
        Ok(entry.resolved_child_count)
    }

    /// Record the combined digest of a directory.
    pub fn set_directory_digest(&mut self, path: &Path, digest: Digest) -> Result<(), IndexError> {
        self.directory_mut(path)?.digest = Some(digest);
        Ok(())
    }

    /// Note a child of directory `path` that the scan saw but could not index.
    ///
    /// Returns the directory's failure count. Unlike the aggregates, this count
    /// is scan data and survives [`clear_directory_aggregates`](Self::clear_directory_aggregates).
    pub fn record_failure(&mut self, path: &Path) -> Result<u64, IndexError> {
        let entry = self.directory_mut(path)?;
        entry.failed_child_count += 1;
        Ok(entry.failed_child_count)
    }

    /// Set `is_duplicate` on every entry: true exactly for paths in `duplicates`.
    pub fn mark_duplicates(&mut self, duplicates: &HashSet<PathBuf>) {
        for (path, entry) in self.entries.iter_mut() {
            entry.is_duplicate = duplicates.contains(path);
        }
    }

    fn directory_mut(&mut self, path: &Path) -> Result<&mut Entry, IndexError> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| IndexError::UnknownPath {
                path: path.to_path_buf(),
            })?;
        if !entry.is_dir() {
            return Err(IndexError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(entry)
    }
}

impl<'a> IntoIterator for &'a TreeIndex {
    type Item = &'a Entry;
    type IntoIter = indexmap::map::Values<'a, PathBuf, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl Extend<Entry> for TreeIndex {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl FromIterator<Entry> for TreeIndex {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeIndex {
        [
            Entry::new_directory("/r", 4096),
            Entry::new_directory("/r/a", 4096),
            Entry::new_file("/r/a/x.txt", 3, Digest::new([1; 32])),
            Entry::new_file("/r/y.txt", 5, Digest::new([2; 32])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_views_by_kind() {
        let index = sample();
        assert_eq!(index.len(), 4);
        assert_eq!(index.files().count(), 2);
        assert_eq!(index.directories().count(), 2);
        assert!(index.is_directory(Path::new("/r/a")));
        assert!(!index.is_directory(Path::new("/r/y.txt")));
    }

    #[test]
    fn test_insert_overwrites_same_path() {
        let mut index = sample();
        let previous = index.insert(Entry::new_file("/r/y.txt", 9, Digest::new([3; 32])));
        assert_eq!(previous.map(|e| e.size), Some(5));
        assert_eq!(index.len(), 4);
        assert_eq!(index.get(Path::new("/r/y.txt")).map(|e| e.size), Some(9));
    }

    #[test]
    fn test_directory_updates() {
        let mut index = sample();
        let dir = Path::new("/r/a");
        index.set_directory_counts(dir, 1, 1, 0).unwrap();
        assert_eq!(index.add_resolved(dir, 1), Ok(1));
        index
            .set_directory_digest(dir, Digest::new([9; 32]))
            .unwrap();

        let entry = index.get(dir).unwrap();
        assert_eq!(entry.total_file_count(), 1);
        assert_eq!(entry.resolved_child_count(), 1);
        assert_eq!(entry.digest(), Some(Digest::new([9; 32])));
    }

    #[test]
    fn test_directory_updates_reject_files_and_unknown_paths() {
        let mut index = sample();
        assert_eq!(
            index.add_resolved(Path::new("/r/y.txt"), 1),
            Err(IndexError::NotADirectory {
                path: PathBuf::from("/r/y.txt")
            })
        );
        assert!(matches!(
            index.set_directory_digest(Path::new("/nope"), Digest::new([0; 32])),
            Err(IndexError::UnknownPath { .. })
        ));
    }

    #[test]
    fn test_clear_directory_aggregates_keeps_file_digests() {
        let mut index = sample();
        index
            .set_directory_digest(Path::new("/r"), Digest::new([7; 32]))
            .unwrap();
        index.clear_directory_aggregates();
        assert_eq!(index.get(Path::new("/r")).unwrap().digest(), None);
        assert!(index.get(Path::new("/r/y.txt")).unwrap().digest().is_some());
    }

    #[test]
    fn test_record_failure_survives_clear() {
        let mut index = sample();
        assert_eq!(index.record_failure(Path::new("/r/a")), Ok(1));
        assert_eq!(index.record_failure(Path::new("/r/a")), Ok(2));
        assert!(matches!(
            index.record_failure(Path::new("/r/y.txt")),
            Err(IndexError::NotADirectory { .. })
        ));

        index.clear_directory_aggregates();
        assert_eq!(index.get(Path::new("/r/a")).unwrap().failed_child_count(), 2);
    }

    #[test]
    fn test_mark_duplicates() {
        let mut index = sample();
        let dups: HashSet<PathBuf> = [PathBuf::from("/r/y.txt")].into_iter().collect();
        index.mark_duplicates(&dups);
        assert!(index.get(Path::new("/r/y.txt")).unwrap().is_duplicate());
        assert!(!index.get(Path::new("/r/a/x.txt")).unwrap().is_duplicate());

        index.mark_duplicates(&HashSet::new());
        assert!(index.iter().all(|e| !e.is_duplicate()));
    }

    #[test]
    fn test_prune_under_keeps_root_and_outside() {
        let mut index = sample();
        index.insert(Entry::new_file("/other/z", 1, Digest::new([4; 32])));
        let seen: HashSet<PathBuf> = [PathBuf::from("/r/a")].into_iter().collect();

        let removed = index.prune_under(Path::new("/r"), &seen);
        assert_eq!(removed, 2);
        assert!(index.contains(Path::new("/r")));
        assert!(index.contains(Path::new("/r/a")));
        assert!(index.contains(Path::new("/other/z")));
        assert!(!index.contains(Path::new("/r/y.txt")));
    }

    #[test]
    fn test_reset() {
        let mut index = sample();
        index.reset();
        assert!(index.is_empty());
    }
}
