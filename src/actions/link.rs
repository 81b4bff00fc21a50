//! Replacing duplicate files with relative symbolic links.
//!
//! # Overview
//!
//! For every fingerprint group with two or more members, one member is kept
//! as a regular file (see [`CanonicalPolicy`]) and each other member is
//! swapped for a symlink whose text is the path of the kept file relative to
//! the link's own directory.
//!
//! # Safety
//!
//! - The canonical file is only read (resolved), never modified.
//! - Before replacing a duplicate, its size and mtime and the canonical's are
//!   compared with what the scan saw; if either changed, the duplicate is
//!   left alone.
//! - A duplicate that is a hard link to the canonical is replaced too, but
//!   counts as zero bytes reclaimed.
//! - The link is created under a temporary sibling name and renamed over
//!   the duplicate, so the path always names either the old file or the
//!   finished link.
//! - A failure on one path is reported and the batch moves on.
//!
//! # Example
//!
//! ```no_run
//! use gphotos_dedupe::actions::link::{deduplicate, LinkConfig, NoProgress};
//! use gphotos_dedupe::duplicates::{CanonicalPolicy, DuplicateFinder};
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("Takeout"))
//!     .unwrap();
//! let report = deduplicate::<NoProgress>(
//!     &groups,
//!     &CanonicalPolicy::default(),
//!     &LinkConfig::default(),
//!     None,
//! );
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::{CanonicalPolicy, FingerprintGroup};
use crate::scanner::path_utils::{relative_path, resolve_parent};
use crate::scanner::FileEntry;

/// Error type for link replacement.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The duplicate was not found (deleted or moved since the scan).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied while replacing the duplicate.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The duplicate is no longer a regular file.
    #[error("not a regular file: {0}")]
    NotRegularFile(PathBuf),

    /// The duplicate was modified since the scan.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// The canonical file changed since the scan.
    #[error("canonical file modified since scan: {0}")]
    CanonicalModified(PathBuf),

    /// The duplicate and the canonical file resolve to the same path.
    #[error("duplicate resolves to the canonical file itself: {0}")]
    SameFile(PathBuf),

    /// The canonical file could not be resolved.
    #[error("canonical file unavailable {path}: {source}")]
    CanonicalUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No relative path leads from the link's directory to the canonical file.
    #[error("no relative path from {link_dir} to {target}")]
    NoRelativePath { link_dir: PathBuf, target: PathBuf },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotRegularFile(p)
            | Self::Modified(p)
            | Self::CanonicalModified(p)
            | Self::SameFile(p)
            | Self::CanonicalUnavailable { path: p, .. }
            | Self::Io { path: p, .. } => p,
            Self::NoRelativePath { link_dir, .. } => link_dir,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// A duplicate that was (or, in dry-run mode, would be) replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Resolved location of the replaced duplicate.
    pub duplicate: PathBuf,
    /// Resolved location of the kept file.
    pub canonical: PathBuf,
    /// Link text, relative to the duplicate's directory.
    pub target: PathBuf,
    /// Bytes freed by the replacement.
    pub size: u64,
    /// Whether the filesystem was left untouched.
    pub dry_run: bool,
}

/// Results of a deduplication pass.
#[derive(Debug, Clone, Default)]
pub struct LinkReport {
    /// Replaced duplicates.
    pub successes: Vec<LinkOutcome>,
    /// Failed replacements with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_reclaimed: u64,
    /// Groups with 2+ members that were processed.
    pub groups_processed: usize,
    /// Whether the pass stopped early on a shutdown request.
    pub interrupted: bool,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl LinkReport {
    /// Number of successful replacements.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed replacements.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all replacements succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the pass.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run {
            "Would replace"
        } else {
            "Replaced"
        };
        let mut summary = format!(
            "{} {} duplicate(s) with links across {} group(s), {} reclaimed",
            verb,
            self.success_count(),
            self.groups_processed,
            ByteSize::b(self.bytes_reclaimed)
        );
        if !self.all_succeeded() {
            summary.push_str(&format!(", {} failed", self.failure_count()));
        }
        if self.interrupted {
            summary.push_str(" (interrupted)");
        }
        summary
    }
}

/// Configuration for link replacement.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Compute link targets without touching the filesystem.
    pub dry_run: bool,
    /// Skip duplicates whose size or mtime changed since the scan.
    pub verify_unchanged: bool,
    /// Optional shutdown flag, checked between files.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            verify_unchanged: true,
            shutdown_flag: None,
        }
    }
}

impl LinkConfig {
    /// Enable/disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable/disable the modified-since-scan check.
    #[must_use]
    pub fn with_verify_unchanged(mut self, verify: bool) -> Self {
        self.verify_unchanged = verify;
        self
    }

    /// Set the shutdown flag for graceful termination.
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
}

/// Callback trait for replacement progress reporting.
pub trait LinkProgressCallback: Send + Sync {
    /// Called before each duplicate is replaced.
    fn on_before_link(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful replacement.
    fn on_link_success(&self, outcome: &LinkOutcome);

    /// Called after a failed replacement.
    fn on_link_failure(&self, path: &Path, error: &str);

    /// Called when the pass completes.
    fn on_complete(&self, report: &LinkReport);
}

/// Callback that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl LinkProgressCallback for NoProgress {
    fn on_before_link(&self, _path: &Path, _index: usize, _total: usize) {}
    fn on_link_success(&self, _outcome: &LinkOutcome) {}
    fn on_link_failure(&self, _path: &Path, _error: &str) {}
    fn on_complete(&self, _report: &LinkReport) {}
}

/// File state captured at scan time, for TOCTOU verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl FileSnapshot {
    /// Snapshot from the metadata the walker recorded.
    #[must_use]
    pub fn from_entry(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.clone(),
            size: entry.size,
            mtime: entry.modified,
        }
    }

    /// Verify that `path` is still a regular file matching this snapshot.
    ///
    /// `path` is the resolved location of the snapshotted file. It is
    /// inspected without following symlinks.
    ///
    /// # Errors
    ///
    /// - `NotRegularFile` if it became a link, directory or special file
    /// - `Modified` if size or mtime changed (only when `check_content`)
    /// - `NotFound` / `PermissionDenied` / `Io` if it cannot be inspected
    pub fn verify(&self, path: &Path, check_content: bool) -> Result<fs::Metadata, LinkError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| LinkError::from_io(path, e))?;

        if !metadata.file_type().is_file() {
            return Err(LinkError::NotRegularFile(path.to_path_buf()));
        }

        if check_content {
            let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if metadata.len() != self.size || mtime != self.mtime {
                log::warn!(
                    "File modified since scan: {} (size {} -> {})",
                    path.display(),
                    self.size,
                    metadata.len()
                );
                return Err(LinkError::Modified(path.to_path_buf()));
            }
        }

        Ok(metadata)
    }
}

/// Replace `duplicate` with a relative symlink to `canonical`.
///
/// Both files are checked against their scan-time size and mtime (unless
/// `verify_unchanged` is off), so a link never points at bytes other than
/// the ones the duplicate held.
///
/// # Errors
///
/// Returns a [`LinkError`] when the canonical file cannot be resolved, either
/// file changed or vanished since the scan, no relative path exists, or link
/// creation fails. The duplicate is left in place on every error.
pub fn replace_with_symlink(
    duplicate: &FileEntry,
    canonical: &FileEntry,
    config: &LinkConfig,
) -> Result<LinkOutcome, LinkError> {
    let canonical_abs =
        fs::canonicalize(&canonical.path).map_err(|e| LinkError::CanonicalUnavailable {
            path: canonical.path.clone(),
            source: e,
        })?;
    let duplicate_abs =
        resolve_parent(&duplicate.path).map_err(|e| LinkError::from_io(&duplicate.path, e))?;

    if duplicate_abs == canonical_abs {
        return Err(LinkError::SameFile(duplicate_abs));
    }

    let canonical_meta = FileSnapshot::from_entry(canonical)
        .verify(&canonical_abs, config.verify_unchanged)
        .map_err(|e| match e {
            LinkError::Modified(p) => LinkError::CanonicalModified(p),
            other => other,
        })?;
    let duplicate_meta =
        FileSnapshot::from_entry(duplicate).verify(&duplicate_abs, config.verify_unchanged)?;

    // a hard link to the canonical inode frees nothing when replaced
    let size = if same_inode(&duplicate_meta, &canonical_meta) {
        0
    } else {
        duplicate_meta.len()
    };

    // resolve_parent always yields a parent
    let link_dir = duplicate_abs.parent().unwrap_or_else(|| Path::new("/"));
    let target = relative_path(&canonical_abs, link_dir).ok_or_else(|| LinkError::NoRelativePath {
        link_dir: link_dir.to_path_buf(),
        target: canonical_abs.clone(),
    })?;

    let outcome = LinkOutcome {
        duplicate: duplicate_abs,
        canonical: canonical_abs,
        target,
        size,
        dry_run: config.dry_run,
    };

    if config.dry_run {
        log::info!(
            "Would link {} -> {}",
            outcome.duplicate.display(),
            outcome.target.display()
        );
        return Ok(outcome);
    }

    swap_in_symlink(&outcome.target, &outcome.duplicate)?;

    log::debug!(
        "Linked {} -> {} ({} bytes freed)",
        outcome.duplicate.display(),
        outcome.target.display(),
        outcome.size
    );
    Ok(outcome)
}

#[cfg(unix)]
fn same_inode(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_a: &fs::Metadata, _b: &fs::Metadata) -> bool {
    false
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Atomically replace the file at `path` with a symlink containing `target`.
fn swap_in_symlink(target: &Path, path: &Path) -> Result<(), LinkError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = temp_link_path(dir, TEMP_COUNTER.fetch_add(1, Ordering::Relaxed));

    if fs::symlink_metadata(&temp).is_ok_and(|m| m.file_type().is_symlink()) {
        log::debug!("Removing stale temporary link {}", temp.display());
        fs::remove_file(&temp).map_err(|e| LinkError::from_io(&temp, e))?;
    }

    create_symlink(target, &temp).map_err(|e| LinkError::from_io(path, e))?;

    if let Err(e) = fs::rename(&temp, path) {
        if let Err(cleanup) = fs::remove_file(&temp) {
            log::warn!(
                "Failed to remove temporary link {}: {}",
                temp.display(),
                cleanup
            );
        }
        return Err(LinkError::from_io(path, e));
    }

    Ok(())
}

/// Hidden name in `dir` used while a link is being created.
///
/// Independent of the duplicate's own name, so it stays short even when
/// that name is at the filesystem's length limit.
fn temp_link_path(dir: &Path, sequence: usize) -> PathBuf {
    dir.join(format!(".gd-{}-{}.tmp", std::process::id(), sequence))
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

/// Replace every non-canonical member of each group with a link.
///
/// Groups with fewer than two members are ignored. Errors are recorded per
/// path and never stop the pass; only a shutdown request does, and only
/// between two files.
pub fn deduplicate<C: LinkProgressCallback>(
    groups: &[FingerprintGroup],
    policy: &CanonicalPolicy,
    config: &LinkConfig,
    callback: Option<&C>,
) -> LinkReport {
    let mut report = LinkReport {
        dry_run: config.dry_run,
        ..LinkReport::default()
    };
    let total: usize = groups.iter().map(FingerprintGroup::duplicate_count).sum();
    let mut index = 0;

    'groups: for group in groups.iter().filter(|g| g.has_duplicates()) {
        let Some(keep) = policy.select_canonical(group) else {
            continue;
        };
        let canonical = &group.files[keep];
        report.groups_processed += 1;

        for (position, file) in group.files.iter().enumerate() {
            if position == keep {
                continue;
            }
            if config.is_shutdown_requested() {
                log::info!("Shutdown requested, stopping before {}", file.path.display());
                report.interrupted = true;
                break 'groups;
            }

            if let Some(cb) = callback {
                cb.on_before_link(&file.path, index, total);
            }
            index += 1;

            match replace_with_symlink(file, canonical, config) {
                Ok(outcome) => {
                    report.bytes_reclaimed += outcome.size;
                    if let Some(cb) = callback {
                        cb.on_link_success(&outcome);
                    }
                    report.successes.push(outcome);
                }
                Err(e) => {
                    let message = e.to_string();
                    log::warn!(
                        "Error replacing {} (keeping {}): {}",
                        file.path.display(),
                        canonical.path.display(),
                        message
                    );
                    if let Some(cb) = callback {
                        cb.on_link_failure(&file.path, &message);
                    }
                    report.failures.push((file.path.clone(), message));
                }
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&report);
    }

    log::info!("{}", report.summary());

    report
}
