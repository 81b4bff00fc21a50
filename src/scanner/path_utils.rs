//! Path helpers for building relative symlink targets.
//!
//! A duplicate is replaced by a link whose text is the path of the canonical
//! file *relative to the directory holding the link*. The archive can then be
//! moved or re-mounted as a whole without breaking any link.
//!
//! Both inputs must already be absolute and free of `.`/`..` components
//! (the output of [`std::fs::canonicalize`]); no filesystem access happens
//! here.
//!
//! # Example
//!
//! ```
//! use gphotos_dedupe::scanner::path_utils::relative_path;
//! use std::path::{Path, PathBuf};
//!
//! let target = Path::new("/takeout/Photos from 2019/IMG_0001.jpg");
//! let link_dir = Path::new("/takeout/Trip to Lisbon");
//!
//! assert_eq!(
//!     relative_path(target, link_dir),
//!     Some(PathBuf::from("../Photos from 2019/IMG_0001.jpg"))
//! );
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

/// Express `target` as a path relative to the directory `base`.
///
/// Returns `None` when no relative path exists: one path is absolute and
/// the other is not, the two live under different prefixes (e.g. another
/// drive letter on Windows), or `base` still contains `..` after the
/// common prefix.
#[must_use]
pub fn relative_path(target: &Path, base: &Path) -> Option<PathBuf> {
    if target.is_absolute() != base.is_absolute() {
        return None;
    }

    let target_components: Vec<Component<'_>> = target.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();

    let common = target_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| a == b)
        .count();

    // Absolute paths must at least share their root.
    if target.is_absolute() && common == 0 {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in &base_components[common..] {
        match component {
            Component::Normal(_) => relative.push(".."),
            Component::CurDir => {}
            _ => return None,
        }
    }
    for component in &target_components[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}

/// Resolve `path` to absolute form without following `path` itself.
///
/// The parent directory is canonicalized (resolving any symlinked
/// ancestors) and the final component is appended unchanged. This is the
/// location where a replacement link will be created.
///
/// # Errors
///
/// Returns an I/O error if the parent directory cannot be resolved.
pub fn resolve_parent(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path has no file name: {}", path.display()),
        )
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    Ok(std::fs::canonicalize(parent)?.join(file_name))
}
