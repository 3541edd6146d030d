//! Pure path derivations shared by the classifier, the index and the snapshot codec.

use std::path::{Path, PathBuf};

use compact_str::CompactString;

/// Name, parent and suffix derived from a path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    /// Final component of the path.
    pub name: CompactString,
    /// Parent directory, `None` for a bare root or single relative component.
    pub parent_path: Option<PathBuf>,
    /// Final component of the parent, empty when there is none.
    pub parent_name: CompactString,
    /// Lower-case extension including the dot, or empty.
    pub suffix: CompactString,
}

impl PathParts {
    /// Derive name, parent and suffix from `path` without touching the filesystem.
    pub fn from_path(path: &Path) -> Self {
        let name = component_name(path);
        let parent_path = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        let parent_name = parent_path
            .as_deref()
            .map(component_name)
            .unwrap_or_default();
        let suffix = extract_suffix(&name);

        Self {
            name,
            parent_path,
            parent_name,
            suffix,
        }
    }
}

/// Extract the lower-case suffix of a file name or path.
///
/// Only the last component is considered. Returns an empty string when there
/// is no dot, when the dot is the first character (`.bashrc`), or when it is
/// the last one (`archive.`).
pub fn extract_suffix(name: &str) -> CompactString {
    let file_name = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx < file_name.len() - 1 => CompactString::new(&file_name[idx..]),
        _ => CompactString::default(),
    }
}

fn component_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}
