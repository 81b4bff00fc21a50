//! Fingerprint grouping of scanned files.
//!
//! # Overview
//!
//! After every regular file has been hashed, files are grouped by their MD5
//! fingerprint. Each file lands in exactly one [`FingerprintGroup`]; groups
//! with a single member are files with no copy anywhere in the archive.
//!
//! Group order is the order in which each fingerprint was first seen, and
//! members keep scan order. Since the walker sorts directory entries, both
//! orders are stable across runs and platforms.
//!
//! # Example
//!
//! ```
//! use gphotos_dedupe::duplicates::group_by_fingerprint;
//! use gphotos_dedupe::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let entry = |p: &str| FileEntry::new(PathBuf::from(p), 3, SystemTime::now());
//! let hashed = vec![
//!     (entry("/a/IMG_1.jpg"), [1u8; 16]),
//!     (entry("/b/IMG_1.jpg"), [1u8; 16]),
//!     (entry("/c/IMG_2.jpg"), [2u8; 16]),
//! ];
//!
//! let (groups, stats) = group_by_fingerprint(hashed);
//!
//! assert_eq!(groups.len(), 2);
//! assert_eq!(stats.duplicate_groups, 1);
//! assert_eq!(stats.duplicate_files, 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::{hash_to_hex, FileEntry, Fingerprint};

/// Files sharing one content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintGroup {
    /// MD5 digest of the content shared by every member
    pub fingerprint: Fingerprint,
    /// Content size in bytes
    pub size: u64,
    /// Members in scan order
    pub files: Vec<FileEntry>,
}

impl FingerprintGroup {
    /// Create a group with its first member.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, first: FileEntry) -> Self {
        Self {
            fingerprint,
            size: first.size,
            files: vec![first],
        }
    }

    /// Append a member, keeping scan order.
    ///
    /// Members share a fingerprint, so their hashed lengths agree; the
    /// group size is taken from the first member.
    pub fn add(&mut self, file: FileEntry) {
        self.files.push(file);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether this group has something to deduplicate (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }

    /// Number of copies that will become links (total - 1 canonical).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes reclaimed once every copy but one is a link.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Fingerprint as a 32-character hex string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.fingerprint)
    }

    /// Paths of the members, in scan order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from fingerprint grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Number of hashed files that were grouped
    pub total_files: usize,
    /// Files whose content appears only once
    pub unique_files: usize,
    /// Groups with 2+ members
    pub duplicate_groups: usize,
    /// Members that will be replaced by links (excluding one canonical per group)
    pub duplicate_files: usize,
    /// Bytes held by those redundant members
    pub wasted_space: u64,
}

/// Group hashed files by fingerprint.
///
/// Every input file ends up in exactly one group. Groups of size one are
/// returned too; use [`FingerprintGroup::has_duplicates`] to filter them.
#[must_use]
pub fn group_by_fingerprint(
    hashed: Vec<(FileEntry, Fingerprint)>,
) -> (Vec<FingerprintGroup>, GroupingStats) {
    let mut index: HashMap<Fingerprint, usize> = HashMap::with_capacity(hashed.len());
    let mut groups: Vec<FingerprintGroup> = Vec::new();
    let total_files = hashed.len();

    for (file, fingerprint) in hashed {
        match index.get(&fingerprint) {
            Some(&i) => groups[i].add(file),
            None => {
                index.insert(fingerprint, groups.len());
                groups.push(FingerprintGroup::new(fingerprint, file));
            }
        }
    }

    let mut stats = GroupingStats {
        total_files,
        ..GroupingStats::default()
    };
    for group in &groups {
        if group.has_duplicates() {
            stats.duplicate_groups += 1;
            stats.duplicate_files += group.duplicate_count();
            stats.wasted_space += group.wasted_space();
        } else {
            stats.unique_files += 1;
        }
    }

    log::debug!(
        "Grouped {} files into {} fingerprints ({} with copies)",
        stats.total_files,
        groups.len(),
        stats.duplicate_groups
    );

    (groups, stats)
}
