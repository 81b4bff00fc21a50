//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Running the walk / hash / group pipeline ([`DuplicateFinder`])
//! - Grouping hashed files by MD5 fingerprint
//! - Choosing the canonical copy that stays a regular file

pub mod canonical;
pub mod finder;
pub mod groups;

pub use canonical::{CanonicalPolicy, DEFAULT_MARKER};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_fingerprint, FingerprintGroup, GroupingStats};
