//! Media categories and their suffix tables.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::ConfigError;

/// Media category used to filter views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaCategory {
    Music,
    Video,
    Image,
    Document,
}

const MUSIC: &[&str] = &[".mp3", ".flac", ".m4a", ".wav"];

const VIDEO: &[&str] = &[
    ".webm", ".mpg", ".mp2", ".mpeg", ".mpe", ".mpv", ".ogg", ".mp4", ".m4p", ".m4v", ".avi",
    ".wmv", ".mov", ".qt", ".flv", ".swf", ".avchd",
];

const IMAGE: &[&str] = &[".tiff", ".tif", ".jpeg", ".jpg", ".gif", ".png", ".raw"];

const DOCUMENT: &[&str] = &[".doc", ".docx", ".odt", ".pdf", ".rtf", ".tex", ".txt", ".wpd"];

/// Recognized lower-case suffixes for every media category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTables {
    pub music: BTreeSet<String>,
    pub video: BTreeSet<String>,
    pub image: BTreeSet<String>,
    pub document: BTreeSet<String>,
}

impl Default for CategoryTables {
    fn default() -> Self {
        fn set(items: &[&str]) -> BTreeSet<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }
        Self {
            music: set(MUSIC),
            video: set(VIDEO),
            image: set(IMAGE),
            document: set(DOCUMENT),
        }
    }
}

impl CategoryTables {
    /// Suffix set for a category.
    pub fn suffixes(&self, category: MediaCategory) -> &BTreeSet<String> {
        match category {
            MediaCategory::Music => &self.music,
            MediaCategory::Video => &self.video,
            MediaCategory::Image => &self.image,
            MediaCategory::Document => &self.document,
        }
    }

    /// Check whether `suffix` belongs to `category`.
    pub fn contains(&self, category: MediaCategory, suffix: &str) -> bool {
        !suffix.is_empty() && self.suffixes(category).contains(suffix)
    }

    /// First category whose table lists `suffix`.
    pub fn category_of(&self, suffix: &str) -> Option<MediaCategory> {
        MediaCategory::iter().find(|c| self.contains(*c, suffix))
    }

    /// Ensure every suffix starts with a dot and is lower case.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in MediaCategory::iter() {
            for suffix in self.suffixes(category) {
                let reason = if !suffix.starts_with('.') {
                    Some("must start with '.'")
                } else if suffix.len() < 2 {
                    Some("must name an extension")
                } else if suffix.to_lowercase() != *suffix {
                    Some("must be lower case")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    return Err(ConfigError::InvalidSuffix {
                        category: category.to_string(),
                        suffix: suffix.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }
}
