//! Scan pipeline: walk, hash, group.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the read-only half of a deduplication pass:
//! 1. **Walk** - collect every regular file under the root (sorted)
//! 2. **Hash** - compute the full MD5 fingerprint of each file, once
//! 3. **Group** - bucket files by fingerprint
//!
//! The filesystem is not modified here.
//!
//! # Read failures
//!
//! A file that cannot be read (permissions, deleted mid-scan, I/O error) is
//! logged, recorded in [`ScanSummary::scan_errors`] and left out of the
//! mapping; the scan goes on. With [`FinderConfig::with_strict`] the first
//! such error aborts the scan instead.
//!
//! # Example
//!
//! ```no_run
//! use gphotos_dedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (groups, summary) = finder.find_duplicates(Path::new("Takeout")).unwrap();
//!
//! println!("{} groups, {} redundant copies", groups.len(), summary.duplicate_files);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::groups::{group_by_fingerprint, FingerprintGroup};
use crate::progress::{phase, ProgressCallback};
use crate::scanner::{FileEntry, Fingerprint, HashError, Hasher, ScanError, Walker, WalkerConfig};

/// Configuration for the scan pipeline.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Abort on the first unreadable file instead of skipping it.
    pub strict: bool,
    /// Directory walking options.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("strict", &self.strict)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Abort the scan on the first read error.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Regular files that were hashed successfully
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Fingerprint groups with 2+ members
    pub duplicate_groups: usize,
    /// Files that will become links (excluding one canonical per group)
    pub duplicate_files: usize,
    /// Bytes freed once every duplicate is a link
    pub reclaimable_space: u64,
    /// Symlinks, special files and filtered files passed over by the walk
    pub skipped_entries: usize,
    /// Non-fatal errors; affected files are not part of any group
    pub scan_errors: Vec<ScanError>,
    /// Duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A file could not be read and strict mode is on.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

/// Runs walk, hash and group over one directory tree.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self { config, hasher }
    }

    /// Create a new finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Scan `root` and return only the groups that have copies.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_groups`].
    pub fn find_duplicates(
        &self,
        root: &Path,
    ) -> Result<(Vec<FingerprintGroup>, ScanSummary), FinderError> {
        let (groups, summary) = self.find_groups(root)?;
        let duplicates = groups.into_iter().filter(FingerprintGroup::has_duplicates).collect();
        Ok((duplicates, summary))
    }

    /// Scan `root` and return every fingerprint group, singletons included.
    ///
    /// # Errors
    ///
    /// - `PathNotFound` / `NotADirectory` if `root` is unusable
    /// - `Interrupted` if shutdown was requested
    /// - `ScanError` for the first unreadable file in strict mode
    pub fn find_groups(
        &self,
        root: &Path,
    ) -> Result<(Vec<FingerprintGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }

        log::info!("Scanning files under {}", root.display());

        let files = self.collect_files(root, &mut summary)?;
        self.group_files(files, summary, start_time)
    }

    /// Hash and group an already collected file list.
    ///
    /// Useful when the caller has its own traversal. Entries are processed
    /// in the given order, which decides canonical fallbacks.
    ///
    /// # Errors
    ///
    /// - `Interrupted` if shutdown was requested
    /// - `ScanError` for the first unreadable file in strict mode
    pub fn find_groups_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<FingerprintGroup>, ScanSummary), FinderError> {
        self.group_files(files, ScanSummary::default(), Instant::now())
    }

    fn group_files(
        &self,
        files: Vec<FileEntry>,
        mut summary: ScanSummary,
        start_time: Instant,
    ) -> Result<(Vec<FingerprintGroup>, ScanSummary), FinderError> {
        let hashed = self.hash_files(files, &mut summary)?;

        summary.total_files = hashed.len();
        summary.total_size = hashed.iter().map(|(f, _)| f.size).sum();

        let (groups, stats) = group_by_fingerprint(hashed);
        summary.duplicate_groups = stats.duplicate_groups;
        summary.duplicate_files = stats.duplicate_files;
        summary.reclaimable_space = stats.wasted_space;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} files ({}), {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.total_files,
            summary.total_size_display(),
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }

    /// Walk the tree and collect regular files.
    fn collect_files(
        &self,
        root: &Path,
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileEntry>, FinderError> {
        let callback = self.config.progress_callback.as_deref();
        if let Some(cb) = callback {
            cb.on_phase_start(phase::WALKING, 0);
        }

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(cb) = callback {
                        cb.on_progress(files.len() + 1, &file.path.to_string_lossy());
                    }
                    files.push(file);
                }
                Err(e) => self.record_error(e, summary)?,
            }
        }
        summary.skipped_entries = walker.skipped_count();

        if let Some(cb) = callback {
            cb.on_phase_end(phase::WALKING);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::debug!(
            "Found {} regular files, skipped {} entries",
            files.len(),
            summary.skipped_entries
        );
        Ok(files)
    }

    /// Hash every collected file exactly once.
    fn hash_files(
        &self,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<(FileEntry, Fingerprint)>, FinderError> {
        let callback = self.config.progress_callback.as_deref();
        if let Some(cb) = callback {
            cb.on_phase_start(phase::HASHING, files.len());
        }

        let mut hashed = Vec::with_capacity(files.len());
        for (index, mut file) in files.into_iter().enumerate() {
            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
            if let Some(cb) = callback {
                cb.on_progress(index + 1, &file.path.to_string_lossy());
            }

            match self.hasher.hash_with_len(&file.path) {
                Ok((fingerprint, len)) => {
                    if len != file.size {
                        log::debug!(
                            "{} changed size during scan ({} -> {} bytes)",
                            file.path.display(),
                            file.size,
                            len
                        );
                        file.size = len;
                    }
                    if let Some(cb) = callback {
                        cb.on_item_completed(file.size);
                    }
                    hashed.push((file, fingerprint));
                }
                Err(HashError::Interrupted(_)) => return Err(FinderError::Interrupted),
                Err(e) => {
                    log::warn!("Skipping unreadable file: {}", e);
                    self.record_error(ScanError::from(e), summary)?;
                }
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end(phase::HASHING);
        }

        Ok(hashed)
    }

    /// Keep a non-fatal error, or abort in strict mode.
    fn record_error(&self, error: ScanError, summary: &mut ScanSummary) -> Result<(), FinderError> {
        if self.config.strict {
            return Err(FinderError::ScanError(error));
        }
        summary.scan_errors.push(error);
        Ok(())
    }
}
