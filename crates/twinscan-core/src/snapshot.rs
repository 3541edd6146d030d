//! Flat CSV snapshot of a [`TreeIndex`].
//!
//! One row per entry, keyed by `path`. Export always writes the header so an
//! empty index survives a round trip. Import merges into an existing index:
//! known paths are overwritten, new paths are appended, and a malformed row is
//! reported without stopping the rest of the file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::entry::{Digest, Entry, EntryKind};
use crate::error::SnapshotError;
use crate::index::TreeIndex;

/// Snapshot columns, in file order.
pub const COLUMNS: [&str; 14] = [
    "path",
    "kind",
    "name",
    "parent_path",
    "parent_name",
    "size",
    "suffix",
    "modified",
    "digest",
    "direct_file_count",
    "total_file_count",
    "resolved_child_count",
    "failed_child_count",
    "is_duplicate",
];

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    path: String,
    kind: String,
    name: String,
    parent_path: String,
    parent_name: String,
    size: u64,
    suffix: String,
    modified: String,
    digest: String,
    direct_file_count: u64,
    total_file_count: u64,
    resolved_child_count: u64,
    failed_child_count: u64,
    is_duplicate: bool,
}

impl From<&Entry> for SnapshotRow {
    fn from(entry: &Entry) -> Self {
        Self {
            path: entry.path.to_string_lossy().into_owned(),
            kind: entry.kind.to_string(),
            name: entry.name.to_string(),
            parent_path: entry
                .parent_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            parent_name: entry.parent_name.to_string(),
            size: entry.size,
            suffix: entry.suffix.to_string(),
            modified: entry
                .modified
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                .unwrap_or_default(),
            digest: entry.digest.map(|d| d.to_hex()).unwrap_or_default(),
            direct_file_count: entry.direct_file_count,
            total_file_count: entry.total_file_count,
            resolved_child_count: entry.resolved_child_count,
            failed_child_count: entry.failed_child_count,
            is_duplicate: entry.is_duplicate,
        }
    }
}

impl TryFrom<SnapshotRow> for Entry {
    type Error = String;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        if row.path.is_empty() {
            return Err("empty path".to_string());
        }
        let kind: EntryKind = row
            .kind
            .parse()
            .map_err(|_| format!("unknown kind {:?}", row.kind))?;
        let digest = match row.digest.as_str() {
            "" => None,
            hex => Some(Digest::from_hex(hex).ok_or_else(|| format!("invalid digest {hex:?}"))?),
        };
        let modified = match row.modified.as_str() {
            "" => None,
            text => Some(
                DateTime::parse_from_rfc3339(text)
                    .map_err(|e| format!("invalid modified time {text:?}: {e}"))?
                    .with_timezone(&Utc),
            ),
        };

        Ok(Entry {
            path: PathBuf::from(row.path),
            kind,
            name: CompactString::new(row.name),
            parent_path: (!row.parent_path.is_empty()).then(|| PathBuf::from(row.parent_path)),
            parent_name: CompactString::new(row.parent_name),
            size: row.size,
            suffix: CompactString::new(row.suffix),
            modified,
            digest,
            direct_file_count: row.direct_file_count,
            total_file_count: row.total_file_count,
            resolved_child_count: row.resolved_child_count,
            failed_child_count: row.failed_child_count,
            is_duplicate: row.is_duplicate,
        })
    }
}

/// Outcome of a snapshot import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Rows merged into the index.
    pub imported: usize,
    /// Rows that could not be parsed, one error each.
    pub rejected: Vec<SnapshotError>,
}

impl ImportReport {
    /// Check if every row was imported.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Write every entry of `index` as CSV, sorted by path.
///
/// Returns the number of rows written.
pub fn export_to_writer<W: Write>(index: &TreeIndex, writer: W) -> Result<usize, SnapshotError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(COLUMNS)?;

    let mut entries: Vec<&Entry> = index.iter().collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    for entry in &entries {
        csv_writer.serialize(SnapshotRow::from(*entry))?;
    }

    csv_writer.flush().map_err(|e| SnapshotError::Csv(e.into()))?;
    Ok(entries.len())
}

/// Export `index` to a CSV file at `path`.
pub fn export_to_path(index: &TreeIndex, path: &Path) -> Result<usize, SnapshotError> {
    let file = File::create(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = export_to_writer(index, BufWriter::new(file))?;
    tracing::debug!(rows, path = %path.display(), "snapshot exported");
    Ok(rows)
}

/// Merge CSV rows from `reader` into `index`.
///
/// Fails outright only when the header lacks a column or the reader itself
/// fails; individual bad rows end up in [`ImportReport::rejected`].
pub fn import_from_reader<R: Read>(
    index: &mut TreeIndex,
    reader: R,
) -> Result<ImportReport, SnapshotError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut report = ImportReport::default();

    // An export of an empty index still has a header, a zero-byte file has nothing
    if headers.is_empty() {
        return Ok(report);
    }

    if let Some(missing) = COLUMNS.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(SnapshotError::MissingColumn {
            column: (*missing).to_string(),
        });
    }

    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or_default();
                let message = err.to_string();
                tracing::warn!(line, %message, "rejected snapshot row");
                report
                    .rejected
                    .push(SnapshotError::MalformedRow { line, message });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let entry = record
            .deserialize::<SnapshotRow>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(Entry::try_from);

        match entry {
            Ok(entry) => {
                index.insert(entry);
                report.imported += 1;
            }
            Err(message) => {
                tracing::warn!(line, %message, "rejected snapshot row");
                report
                    .rejected
                    .push(SnapshotError::MalformedRow { line, message });
            }
        }
    }

    Ok(report)
}

/// Merge a CSV snapshot file into `index`.
pub fn import_from_path(index: &mut TreeIndex, path: &Path) -> Result<ImportReport, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let report = import_from_reader(index, BufReader::new(file))?;
    tracing::debug!(
        imported = report.imported,
        rejected = report.rejected.len(),
        path = %path.display(),
        "snapshot imported"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_index() -> TreeIndex {
        let mut index: TreeIndex = [
            Entry::new_directory("/r", 4096),
            Entry::new_directory("/r/a, b", 4096),
            Entry::new_file("/r/a, b/song.MP3", 7, Digest::new([5; 32]))
                .with_modified(DateTime::from_timestamp(1_600_000_000, 123_456_789)),
            Entry::new_file("/r/empty", 0, crate::fingerprint::empty_digest()),
        ]
        .into_iter()
        .collect();
        index
            .set_directory_counts(Path::new("/r/a, b"), 1, 1, 1)
            .unwrap();
        index
            .set_directory_digest(Path::new("/r/a, b"), Digest::new([6; 32]))
            .unwrap();
        index.record_failure(Path::new("/r")).unwrap();
        let dups: HashSet<PathBuf> = [PathBuf::from("/r/empty")].into_iter().collect();
        index.mark_duplicates(&dups);
        index
    }

    fn roundtrip(index: &TreeIndex) -> (TreeIndex, ImportReport) {
        let mut buffer = Vec::new();
        export_to_writer(index, &mut buffer).unwrap();
        let mut restored = TreeIndex::new();
        let report = import_from_reader(&mut restored, buffer.as_slice()).unwrap();
        (restored, report)
    }

    #[test]
    fn test_roundtrip_preserves_every_field() {
        let index = sample_index();
        let (restored, report) = roundtrip(&index);

        assert!(report.is_clean());
        assert_eq!(report.imported, 4);
        assert_eq!(restored.len(), index.len());
        for entry in &index {
            assert_eq!(restored.get(&entry.path), Some(entry));
        }
    }

    #[test]
    fn test_empty_index_roundtrip() {
        let (restored, report) = roundtrip(&TreeIndex::new());
        assert!(restored.is_empty());
        assert_eq!(report.imported, 0);
    }

    #[test]
    fn test_zero_byte_input_imports_nothing() {
        let mut index = TreeIndex::new();
        let report = import_from_reader(&mut index, &b""[..]).unwrap();
        assert!(index.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_import_merges_and_overwrites() {
        let mut index = sample_index();
        index.insert(Entry::new_file("/r/other", 1, Digest::new([8; 32])));

        let mut newer = TreeIndex::new();
        newer.insert(Entry::new_file("/r/empty", 42, Digest::new([1; 32])));
        newer.insert(Entry::new_file("/r/new", 3, Digest::new([2; 32])));
        let mut buffer = Vec::new();
        export_to_writer(&newer, &mut buffer).unwrap();

        let report = import_from_reader(&mut index, buffer.as_slice()).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(index.len(), 6);
        assert_eq!(index.get(Path::new("/r/empty")).unwrap().size, 42);
        assert!(index.contains(Path::new("/r/other")));
        assert!(index.contains(Path::new("/r/new")));
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let index = sample_index();
        let mut buffer = Vec::new();
        export_to_writer(&index, &mut buffer).unwrap();

        let mut restored = TreeIndex::new();
        import_from_reader(&mut restored, buffer.as_slice()).unwrap();
        import_from_reader(&mut restored, buffer.as_slice()).unwrap();
        assert_eq!(restored.len(), index.len());
    }

    #[test]
    fn test_missing_column_rejects_file() {
        let data = "path,kind,name\n/r/x,file,x\n";
        let mut index = TreeIndex::new();
        let err = import_from_reader(&mut index, data.as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingColumn { .. }));
        assert!(index.is_empty());
    }

    #[test]
    fn test_malformed_rows_reported_rest_imported() {
        let index = sample_index();
        let mut buffer = Vec::new();
        export_to_writer(&index, &mut buffer).unwrap();
        let mut text = String::from_utf8(buffer).unwrap();
        text.push_str("/r/bad,folder,bad,/r,r,1,,,,0,0,0,0,false\n");
        text.push_str("/r/worse,file,worse,/r,r,not-a-number,,,,0,0,0,0,false\n");
        text.push_str("/r/baddigest,file,x,/r,r,1,,,abc,0,0,0,0,false\n");

        let mut restored = TreeIndex::new();
        let report = import_from_reader(&mut restored, text.as_bytes()).unwrap();
        assert_eq!(report.imported, 4);
        assert_eq!(report.rejected.len(), 3);
        assert!(report
            .rejected
            .iter()
            .all(|e| matches!(e, SnapshotError::MalformedRow { line, .. } if *line > 1)));
        assert!(!restored.contains(Path::new("/r/bad")));
    }

    #[test]
    fn test_invalid_utf8_row_rejected_rest_imported() {
        let index = sample_index();
        let mut buffer = Vec::new();
        export_to_writer(&index, &mut buffer).unwrap();
        buffer.extend_from_slice(b"/r/\xff\xfe,file,x,/r,r,1,,,,0,0,0,0,false\n");

        let mut restored = TreeIndex::new();
        let report = import_from_reader(&mut restored, buffer.as_slice()).unwrap();
        assert_eq!(report.imported, 4);
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(
            report.rejected[0],
            SnapshotError::MalformedRow { line, .. } if line > 1
        ));
    }

    #[test]
    fn test_failure_counts_survive_roundtrip() {
        let (restored, _) = roundtrip(&sample_index());
        assert_eq!(restored.get(Path::new("/r")).unwrap().failed_child_count(), 1);
    }

    #[test]
    fn test_export_to_path_and_back() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("snapshot.csv");
        let index = sample_index();

        assert_eq!(export_to_path(&index, &file).unwrap(), 4);
        let mut restored = TreeIndex::new();
        let report = import_from_path(&mut restored, &file).unwrap();
        assert_eq!(report.imported, 4);
    }

    #[test]
    fn test_import_missing_file() {
        let mut index = TreeIndex::new();
        let err = import_from_path(&mut index, Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
