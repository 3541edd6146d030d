//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::fingerprint::DEFAULT_PREFIX_BYTES;

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan (file or directory).
    pub root: PathBuf,

    /// Number of leading bytes fingerprinted per file.
    #[builder(default = "DEFAULT_PREFIX_BYTES")]
    #[serde(default = "default_prefix_bytes")]
    pub prefix_bytes: u64,

    /// Number of fingerprinting threads (0 = rayon default pool).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// File name glob patterns to skip.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Remove entries under the root that this scan no longer sees.
    #[builder(default = "false")]
    #[serde(default)]
    pub prune_stale: bool,
}

fn default_true() -> bool {
    true
}

fn default_prefix_bytes() -> u64 {
    DEFAULT_PREFIX_BYTES
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.prefix_bytes == Some(0) {
            return Err("Prefix length must be at least one byte".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix_bytes: DEFAULT_PREFIX_BYTES,
            threads: 0,
            follow_symlinks: false,
            include_hidden: true,
            ignore_patterns: Vec::new(),
            prune_stale: false,
        }
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
