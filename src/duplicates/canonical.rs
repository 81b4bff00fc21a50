//! Choosing which copy in a group stays a regular file.
//!
//! Google Photos Takeout puts every photo in a per-year folder such as
//! `Photos from 2019`, and again in each album that contains it. The year
//! folder is the stable home of a photo, so its copy is kept and album
//! copies become links.
//!
//! Rules, applied per group:
//! 1. The first member (in scan order) whose immediate parent directory name
//!    contains the marker substring is canonical.
//! 2. Otherwise the first member is canonical.

use std::path::Path;

use super::FingerprintGroup;

/// Parent-directory marker used by Google Photos Takeout year folders.
pub const DEFAULT_MARKER: &str = "Photos from";

/// Folder-name heuristic for picking the canonical member of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPolicy {
    marker: String,
}

impl Default for CanonicalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl CanonicalPolicy {
    /// Create a policy matching parent directories that contain `marker`.
    ///
    /// An empty marker matches nothing, leaving only the first-member rule.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// The configured marker substring.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether the immediate parent directory of `path` carries the marker.
    #[must_use]
    pub fn is_canonical_folder(&self, path: &Path) -> bool {
        if self.marker.is_empty() {
            return false;
        }

        path.parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name.to_string_lossy().contains(self.marker.as_str()))
    }

    /// Index of the member to keep.
    ///
    /// Returns `None` only for an empty group.
    #[must_use]
    pub fn select_canonical(&self, group: &FingerprintGroup) -> Option<usize> {
        if group.is_empty() {
            return None;
        }

        let selected = group
            .files
            .iter()
            .position(|f| self.is_canonical_folder(&f.path));

        match selected {
            Some(index) => {
                log::trace!(
                    "{}: keeping marked copy {}",
                    group.hash_hex(),
                    group.files[index].path.display()
                );
                Some(index)
            }
            None => {
                log::trace!(
                    "{}: no '{}' folder, keeping first copy {}",
                    group.hash_hex(),
                    self.marker,
                    group.files[0].path.display()
                );
                Some(0)
            }
        }
    }
}
