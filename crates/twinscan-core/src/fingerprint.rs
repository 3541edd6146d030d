//! Prefix fingerprints for files and blob fingerprints for directory combination.
//!
//! Only the first `prefix_bytes` of a file are hashed. Large files that share
//! an identical prefix but differ later therefore receive equal fingerprints;
//! this is the accepted price for scanning large collections quickly.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::entry::Digest;
use crate::error::ScanError;

/// Default number of leading bytes hashed per file.
pub const DEFAULT_PREFIX_BYTES: u64 = 4096;

/// Computes BLAKE3 fingerprints over bounded file prefixes.
#[derive(Debug, Clone, Copy)]
pub struct ContentFingerprinter {
    prefix_bytes: u64,
}

impl ContentFingerprinter {
    /// Create a fingerprinter hashing at most `prefix_bytes` of each file.
    pub fn new(prefix_bytes: u64) -> Self {
        Self { prefix_bytes }
    }

    /// Number of leading bytes hashed.
    pub fn prefix_bytes(&self) -> u64 {
        self.prefix_bytes
    }

    /// Fingerprint the first `prefix_bytes` of the file at `path`.
    ///
    /// Returns the digest and the number of bytes actually read.
    pub fn fingerprint_file(&self, path: &Path) -> Result<(Digest, u64), ScanError> {
        let file = File::open(path).map_err(|e| ScanError::io(path, e))?;

        let mut buffer = Vec::with_capacity(self.prefix_bytes.min(64 * 1024) as usize);
        file.take(self.prefix_bytes)
            .read_to_end(&mut buffer)
            .map_err(|e| ScanError::io(path, e))?;

        Ok((fingerprint_blob(&buffer), buffer.len() as u64))
    }
}

impl Default for ContentFingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX_BYTES)
    }
}

/// Fingerprint an arbitrary byte sequence with the same algorithm used for files.
pub fn fingerprint_blob(bytes: &[u8]) -> Digest {
    Digest::new(*blake3::hash(bytes).as_bytes())
}

/// Fingerprint of the empty byte sequence, shared by every childless directory.
pub fn empty_digest() -> Digest {
    fingerprint_blob(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_files_same_digest() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "duplicate content here").unwrap();
        fs::write(temp.path().join("b"), "duplicate content here").unwrap();
        fs::write(temp.path().join("c"), "unique content").unwrap();

        let fp = ContentFingerprinter::default();
        let (a, read) = fp.fingerprint_file(&temp.path().join("a")).unwrap();
        let (b, _) = fp.fingerprint_file(&temp.path().join("b")).unwrap();
        let (c, _) = fp.fingerprint_file(&temp.path().join("c")).unwrap();

        assert_eq!(read, 22);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_only_prefix_is_hashed() {
        let temp = TempDir::new().unwrap();
        let mut long = vec![b'x'; 100];
        fs::write(temp.path().join("short"), &long).unwrap();
        long.extend_from_slice(b"tail that differs");
        fs::write(temp.path().join("long"), &long).unwrap();

        let fp = ContentFingerprinter::new(100);
        let (short, _) = fp.fingerprint_file(&temp.path().join("short")).unwrap();
        let (long, read) = fp.fingerprint_file(&temp.path().join("long")).unwrap();

        assert_eq!(read, 100);
        assert_eq!(short, long);
    }

    #[test]
    fn test_empty_file_has_empty_digest() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("empty"), "").unwrap();

        let (digest, read) = ContentFingerprinter::default()
            .fingerprint_file(&temp.path().join("empty"))
            .unwrap();
        assert_eq!(read, 0);
        assert_eq!(digest, empty_digest());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = ContentFingerprinter::default()
            .fingerprint_file(&temp.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_blob_is_deterministic() {
        assert_eq!(fingerprint_blob(b"abc"), fingerprint_blob(b"abc"));
        assert_ne!(fingerprint_blob(b"abc"), fingerprint_blob(b"abd"));
    }
}
