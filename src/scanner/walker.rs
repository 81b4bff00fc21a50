//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing an archive and
//! collecting the regular files that take part in deduplication.
//!
//! # Features
//!
//! - Single-threaded recursive traversal, entries sorted by file name so
//!   that "first encountered" is the same on every platform
//! - Symbolic links are never followed and never yielded; a link left by a
//!   previous run is skipped, which keeps re-runs idempotent
//! - Sockets, FIFOs and device files are skipped
//! - Hidden and empty file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use gphotos_dedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("Takeout/Google Photos"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("{} regular files, {} entries skipped", files.len(), walker.skipped_count());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for regular-file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Non-regular entries skipped so far
    skipped: AtomicUsize,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            skipped: AtomicUsize::new(0),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Number of symlinks, special files and filtered files skipped so far.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    fn skip(&self, reason: &str, path: &Path) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        log::trace!("Skipping {}: {}", reason, path.display());
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the directory tree, yielding regular files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Files are yielded in sorted depth-first order.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        walk_dir
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || !(skip_hidden && Self::is_hidden(entry)))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(self.handle_walkdir_error(e))),
            })
    }

    /// Classify a directory entry and build a `FileEntry` for regular files.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileEntry, ScanError>> {
        let file_type = entry.file_type();
        let path = entry.path();

        if file_type.is_dir() {
            return None;
        }
        if file_type.is_symlink() {
            self.skip("symlink", path);
            return None;
        }
        if !file_type.is_file() {
            self.skip("special file", path);
            return None;
        }

        // follow_links(false): this is lstat metadata
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walkdir_error(e))),
        };

        let size = metadata.len();
        if size == 0 && self.config.skip_empty {
            self.skip("empty file", path);
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Some(Ok(FileEntry::new(path.to_path_buf(), size, modified)))
    }

    /// Convert a walkdir error into a `ScanError`.
    fn handle_walkdir_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        let err = match error.into_io_error() {
            Some(io_err) => ScanError::from_io(path.clone(), io_err),
            None => ScanError::Io {
                path: path.clone(),
                source: std::io::Error::other("filesystem loop detected"),
            },
        };

        match err {
            ScanError::NotFound(_) => {
                log::debug!("Entry vanished during walk: {}", path.display());
            }
            _ => log::warn!("Walker error for {}: {}", path.display(), err),
        }
        err
    }
}
