//! File actions module.
//!
//! The link module replaces duplicate copies with relative symbolic links:
//! - One canonical copy per group stays a regular file
//! - Links are created under a temporary name and renamed into place
//! - Groups whose canonical or duplicate changed since the scan are skipped
//! - Batch operations with progress reporting; one failure never stops the batch
//!
//! ```no_run
//! use gphotos_dedupe::actions::{replace_with_symlink, LinkConfig};
//! use gphotos_dedupe::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let scanned = SystemTime::now();
//! let canonical = FileEntry::new(PathBuf::from("Photos from 2019/IMG_1.jpg"), 1024, scanned);
//! let duplicate = FileEntry::new(PathBuf::from("Album/IMG_1.jpg"), 1024, scanned);
//! let outcome = replace_with_symlink(&duplicate, &canonical, &LinkConfig::default());
//! ```

pub mod link;

pub use link::{
    deduplicate, replace_with_symlink, FileSnapshot, LinkConfig, LinkError, LinkOutcome,
    LinkProgressCallback, LinkReport, NoProgress,
};
