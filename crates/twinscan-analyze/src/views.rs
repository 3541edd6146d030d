//! Filtered, sorted views over a classified index.

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use twinscan_core::{CategoryTables, Digest, Entry, EntryKind, MediaCategory, TreeIndex};

use crate::duplicates::flagged;

/// Which duplicates a view selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateFilter {
    /// Every duplicate entry.
    All,
    /// Duplicate files only.
    Files,
    /// Duplicate directories only.
    Directories,
    /// Duplicate files whose suffix belongs to a media category.
    Category(MediaCategory),
}

impl DuplicateFilter {
    fn accepts(self, entry: &Entry, tables: &CategoryTables) -> bool {
        match self {
            DuplicateFilter::All => true,
            DuplicateFilter::Files => entry.is_file(),
            DuplicateFilter::Directories => entry.is_dir(),
            DuplicateFilter::Category(category) => {
                entry.is_file() && tables.contains(category, &entry.suffix)
            }
        }
    }
}

/// One line of a rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Lower-case hex digest, empty when unset.
    pub digest: String,
    pub kind: EntryKind,
    pub size: u64,
    pub name: String,
    pub parent_name: String,
    /// Full path, kept for machine-readable output.
    pub path: PathBuf,
}

impl From<&Entry> for ReportRow {
    fn from(entry: &Entry) -> Self {
        Self {
            digest: entry.digest().map(|d| d.to_hex()).unwrap_or_default(),
            kind: entry.kind,
            size: entry.size,
            name: entry.name.to_string(),
            parent_name: entry.parent_name.to_string(),
            path: entry.path.clone(),
        }
    }
}

/// Duplicate entries matching `filter`, ordered by digest, then size, then
/// path descending, so members of a group are adjacent.
///
/// Reads the flags left by the last classification.
pub fn duplicates<'a>(
    index: &'a TreeIndex,
    filter: DuplicateFilter,
    tables: &CategoryTables,
) -> Vec<&'a Entry> {
    let mut rows: Vec<&Entry> = flagged(index)
        .filter(|e| filter.accepts(e, tables))
        .collect();
    rows.sort_by(|a, b| by_group(a, b));
    rows
}

/// Every file whose suffix belongs to `category`, duplicate or not, ordered by path.
pub fn find_category<'a>(
    index: &'a TreeIndex,
    category: MediaCategory,
    tables: &CategoryTables,
) -> Vec<&'a Entry> {
    let mut rows: Vec<&Entry> = index
        .files()
        .filter(|e| tables.contains(category, &e.suffix))
        .collect();
    rows.sort_by(|a, b| a.path.cmp(&b.path));
    rows
}

/// Convert a view into report rows.
pub fn to_rows(entries: &[&Entry]) -> Vec<ReportRow> {
    entries.iter().map(|e| ReportRow::from(*e)).collect()
}

fn by_group(a: &Entry, b: &Entry) -> Ordering {
    let key = |e: &Entry| e.digest().unwrap_or(Digest::new([0; 32]));
    key(a)
        .cmp(&key(b))
        .then(a.size.cmp(&b.size))
        .then_with(|| b.path.cmp(&a.path))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::DuplicateClassifier;

    fn d(byte: u8) -> Digest {
        Digest::new([byte; 32])
    }

    fn classified() -> TreeIndex {
        let mut index: TreeIndex = [
            Entry::new_directory("/r", 0),
            Entry::new_file("/r/song.mp3", 10, d(2)),
            Entry::new_file("/r/song copy.MP3", 10, d(2)),
            Entry::new_file("/r/a.txt", 3, d(1)),
            Entry::new_file("/r/b.txt", 3, d(1)),
            Entry::new_file("/r/lonely.flac", 7, d(5)),
            Entry::new_directory("/r/x", 0),
            Entry::new_directory("/r/y", 0),
        ]
        .into_iter()
        .collect();
        index.set_directory_digest(Path::new("/r/x"), d(3)).unwrap();
        index.set_directory_digest(Path::new("/r/y"), d(3)).unwrap();
        DuplicateClassifier::new().classify(&mut index);
        index
    }

    fn paths(entries: &[&Entry]) -> Vec<String> {
        entries.iter().map(|e| e.path.display().to_string()).collect()
    }

    #[test]
    fn test_all_duplicates_sorted() {
        let index = classified();
        let view = duplicates(&index, DuplicateFilter::All, &CategoryTables::default());
        assert_eq!(
            paths(&view),
            vec![
                "/r/b.txt",
                "/r/a.txt",
                "/r/song.mp3",
                "/r/song copy.MP3",
                "/r/y",
                "/r/x",
            ]
        );
    }

    #[test]
    fn test_kind_filters() {
        let index = classified();
        let tables = CategoryTables::default();

        let files = duplicates(&index, DuplicateFilter::Files, &tables);
        assert_eq!(files.len(), 4);
        assert!(files.iter().all(|e| e.is_file()));

        let dirs = duplicates(&index, DuplicateFilter::Directories, &tables);
        assert_eq!(paths(&dirs), vec!["/r/y", "/r/x"]);
    }

    #[test]
    fn test_category_filter_uses_lowercase_suffix() {
        let index = classified();
        let tables = CategoryTables::default();

        let music = duplicates(&index, DuplicateFilter::Category(MediaCategory::Music), &tables);
        assert_eq!(paths(&music), vec!["/r/song.mp3", "/r/song copy.MP3"]);

        let images = duplicates(&index, DuplicateFilter::Category(MediaCategory::Image), &tables);
        assert!(images.is_empty());
    }

    #[test]
    fn test_find_category_includes_non_duplicates() {
        let index = classified();
        let music = find_category(&index, MediaCategory::Music, &CategoryTables::default());
        assert_eq!(
            paths(&music),
            vec!["/r/lonely.flac", "/r/song copy.MP3", "/r/song.mp3"]
        );
    }

    #[test]
    fn test_report_row_fields() {
        let entry = Entry::new_file("/music/album/track.mp3", 42, d(0xab));
        let row = ReportRow::from(&entry);
        assert_eq!(row.digest, "ab".repeat(32));
        assert_eq!(row.kind, EntryKind::File);
        assert_eq!(row.size, 42);
        assert_eq!(row.name, "track.mp3");
        assert_eq!(row.parent_name, "album");
    }
}
