use gphotos_dedupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use gphotos_dedupe::scanner::{FileEntry, HashError, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn entry(path: PathBuf, size: u64) -> FileEntry {
    FileEntry::new(path, size, SystemTime::now())
}

#[test]
fn test_unreadable_file_skipped_by_default() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "x/a.jpg", b"same");
    let b = write(dir.path(), "y/a.jpg", b"same");
    let files = vec![
        entry(a, 4),
        entry(dir.path().join("vanished.jpg"), 4),
        entry(b, 4),
    ];

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_groups_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.scan_errors.len(), 1);
    match &summary.scan_errors[0] {
        ScanError::HashError(HashError::NotFound(path)) => {
            assert!(path.ends_with("vanished.jpg"));
        }
        other => panic!("Expected NotFound HashError, got: {other:?}"),
    }
}

#[test]
fn test_unreadable_file_aborts_in_strict_mode() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "x/a.jpg", b"same");
    let files = vec![entry(dir.path().join("vanished.jpg"), 4), entry(a, 4)];

    let finder = DuplicateFinder::new(FinderConfig::default().with_strict(true));
    let result = finder.find_groups_from_files(files);

    match result {
        Err(FinderError::ScanError(ScanError::HashError(HashError::NotFound(_)))) => {}
        other => panic!("Expected strict-mode abort, got: {other:?}"),
    }
}

#[test]
fn test_directory_entry_counts_as_read_error() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("folder.jpg")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_groups_from_files(vec![entry(dir.path().join("folder.jpg"), 0)])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.scan_errors.len(), 1);
}

#[cfg(unix)]
mod link_failures {
    use super::*;
    use gphotos_dedupe::actions::{deduplicate, LinkConfig, NoProgress};
    use gphotos_dedupe::duplicates::CanonicalPolicy;

    #[test]
    fn test_failed_replacement_does_not_stop_batch() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Photos from 2019/a.jpg", b"first");
        let gone = write(dir.path(), "Album/a.jpg", b"first");
        let still = write(dir.path(), "Other/a.jpg", b"first");
        write(dir.path(), "Photos from 2019/b.jpg", b"second");
        let b_copy = write(dir.path(), "Album/b.jpg", b"second");

        let (groups, _) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();
        fs::remove_file(&gone).unwrap();

        let report = deduplicate::<NoProgress>(
            &groups,
            &CanonicalPolicy::default(),
            &LinkConfig::default(),
            None,
        );

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].0, gone);
        assert_eq!(report.success_count(), 2);
        assert!(!report.interrupted);
        assert!(fs::symlink_metadata(&still).unwrap().file_type().is_symlink());
        assert!(fs::symlink_metadata(&b_copy).unwrap().file_type().is_symlink());
    }

    #[test]
    fn test_missing_canonical_leaves_duplicates_in_place() {
        let dir = tempdir().unwrap();
        let keep = write(dir.path(), "Photos from 2019/a.jpg", b"same");
        let one = write(dir.path(), "Album/a.jpg", b"same");
        let two = write(dir.path(), "Other/a.jpg", b"same");

        let (groups, _) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();
        fs::remove_file(&keep).unwrap();

        let report = deduplicate::<NoProgress>(
            &groups,
            &CanonicalPolicy::default(),
            &LinkConfig::default(),
            None,
        );

        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.success_count(), 0);
        assert_eq!(fs::read(&one).unwrap(), b"same");
        assert_eq!(fs::read(&two).unwrap(), b"same");
        assert!(fs::symlink_metadata(&one).unwrap().file_type().is_file());
    }
}
