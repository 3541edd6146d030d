//! Settings file handling.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use twinscan_core::CategoryTables;

/// `[scan]` defaults; command-line flags override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub prefix_bytes: Option<u64>,
    pub threads: Option<usize>,
    pub follow_symlinks: bool,
    pub include_hidden: Option<bool>,
    pub ignore_patterns: Vec<String>,
    pub prune_stale: bool,
}

/// Formatting of rendered views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStyle {
    /// Widest a name or parent name column may get before truncation.
    pub max_width: usize,
    /// Leading hex characters of the digest to show; 0 shows all 64.
    pub digest_chars: usize,
    /// Print sizes as KiB/MiB instead of raw bytes.
    pub human_sizes: bool,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            max_width: 40,
            digest_chars: 16,
            human_sizes: true,
        }
    }
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanSettings,
    pub categories: CategoryTables,
    pub report: ReportStyle,
}

impl Settings {
    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("twinscan").join("config.toml"))
    }

    /// Load settings from `explicit`, or from the default path when present.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Invalid settings {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings text.
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.categories.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.categories.contains(twinscan_core::MediaCategory::Music, ".mp3"));
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::parse(
            r#"
            [scan]
            prefix_bytes = 1024
            ignore_patterns = ["*.tmp"]

            [report]
            digest_chars = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.scan.prefix_bytes, Some(1024));
        assert_eq!(settings.scan.ignore_patterns, vec!["*.tmp".to_string()]);
        assert_eq!(settings.report.digest_chars, 8);
        assert_eq!(settings.report.max_width, 40);
    }

    #[test]
    fn test_custom_category_table() {
        let settings = Settings::parse(
            r#"
            [categories]
            music = [".opus"]
            "#,
        )
        .unwrap();

        let music = twinscan_core::MediaCategory::Music;
        assert!(settings.categories.contains(music, ".opus"));
        assert!(!settings.categories.contains(music, ".mp3"));
        assert!(settings.categories.contains(twinscan_core::MediaCategory::Image, ".png"));
    }

    #[test]
    fn test_invalid_suffix_rejected() {
        let err = Settings::parse(
            r#"
            [categories]
            image = ["PNG"]
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(Settings::load(Some(&temp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[report]\nhuman_sizes = false\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(!settings.report.human_sizes);
    }
}
