#![cfg(unix)]

use filetime::{set_file_mtime, FileTime};
use gphotos_dedupe::actions::{deduplicate, LinkConfig, LinkError, NoProgress};
use gphotos_dedupe::duplicates::{CanonicalPolicy, DuplicateFinder};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).unwrap().file_type().is_symlink()
}

fn is_regular(path: &Path) -> bool {
    fs::symlink_metadata(path).unwrap().file_type().is_file()
}

fn dedupe(root: &Path, config: &LinkConfig) -> gphotos_dedupe::actions::LinkReport {
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(root)
        .unwrap();
    deduplicate::<NoProgress>(&groups, &CanonicalPolicy::default(), config, None)
}

#[test]
fn test_marker_folder_copy_is_kept() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A/photo.jpg", b"same pixels");
    let year = write(dir.path(), "Photos from 2020/photo.jpg", b"same pixels");
    let b = write(dir.path(), "B/photo.jpg", b"same pixels");

    let report = dedupe(dir.path(), &LinkConfig::default());

    assert_eq!(report.success_count(), 2);
    assert!(is_regular(&year));
    for link in [&a, &b] {
        assert!(is_symlink(link));
        assert_eq!(
            fs::read_link(link).unwrap(),
            PathBuf::from("../Photos from 2020/photo.jpg")
        );
    }
}

#[test]
fn test_first_copy_kept_without_marker() {
    let dir = tempdir().unwrap();
    let x = write(dir.path(), "X/img.jpg", b"same");
    let y = write(dir.path(), "Y/img.jpg", b"same");

    dedupe(dir.path(), &LinkConfig::default());

    assert!(is_regular(&x));
    assert!(is_symlink(&y));
    assert_eq!(fs::read_link(&y).unwrap(), PathBuf::from("../X/img.jpg"));
}

#[test]
fn test_links_resolve_to_identical_content() {
    let dir = tempdir().unwrap();
    let content = vec![0xA5u8; 10_000];
    let keep = write(dir.path(), "Photos from 2019/IMG_0042.jpg", &content);
    let deep = write(dir.path(), "Albums/Portugal/Day 1/IMG_0042.jpg", &content);
    let sibling = write(dir.path(), "Photos from 2019/IMG_0042_copy.jpg", &content);

    let report = dedupe(dir.path(), &LinkConfig::default());

    assert!(report.all_succeeded());
    assert_eq!(report.bytes_reclaimed, 20_000);
    assert_eq!(
        fs::read_link(&deep).unwrap(),
        PathBuf::from("../../../Photos from 2019/IMG_0042.jpg")
    );
    assert_eq!(fs::read_link(&sibling).unwrap(), PathBuf::from("IMG_0042.jpg"));
    for link in [&deep, &sibling] {
        assert!(fs::read_link(link).unwrap().is_relative());
        assert_eq!(fs::read(link).unwrap(), content);
        assert_eq!(
            fs::canonicalize(link).unwrap(),
            fs::canonicalize(&keep).unwrap()
        );
    }
}

#[test]
fn test_canonical_file_untouched() {
    let dir = tempdir().unwrap();
    let keep = write(dir.path(), "Photos from 2018/a.jpg", b"original");
    write(dir.path(), "Album/a.jpg", b"original");
    set_file_mtime(&keep, FileTime::from_unix_time(1_500_000_000, 0)).unwrap();
    let before = fs::metadata(&keep).unwrap();

    dedupe(dir.path(), &LinkConfig::default());

    let after = fs::symlink_metadata(&keep).unwrap();
    assert!(after.file_type().is_file());
    assert_eq!(after.len(), before.len());
    assert_eq!(after.modified().unwrap(), before.modified().unwrap());
    assert_eq!(fs::read(&keep).unwrap(), b"original");
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Photos from 2019/a.jpg", b"same");
    let album = write(dir.path(), "Album/a.jpg", b"same");
    write(dir.path(), "Other/a.jpg", b"same");

    let first = dedupe(dir.path(), &LinkConfig::default());
    assert_eq!(first.success_count(), 2);
    let link_before = fs::read_link(&album).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.skipped_entries, 2);

    let second = dedupe(dir.path(), &LinkConfig::default());
    assert_eq!(second.success_count(), 0);
    assert_eq!(second.failure_count(), 0);
    assert_eq!(fs::read_link(&album).unwrap(), link_before);
}

#[test]
fn test_dry_run_leaves_tree_unchanged() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Photos from 2019/a.jpg", b"same");
    let album = write(dir.path(), "Album/a.jpg", b"same");

    let report = dedupe(dir.path(), &LinkConfig::default().with_dry_run(true));

    assert!(report.dry_run);
    assert_eq!(report.success_count(), 1);
    assert_eq!(
        report.successes[0].target,
        PathBuf::from("../Photos from 2019/a.jpg")
    );
    assert!(is_regular(&album));
    assert!(report.summary().starts_with("Would replace 1"));
}

#[test]
fn test_modified_duplicate_is_left_alone() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Photos from 2019/a.jpg", b"same");
    let touched = write(dir.path(), "Album/a.jpg", b"same");
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    set_file_mtime(&touched, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();

    let report = deduplicate::<NoProgress>(
        &groups,
        &CanonicalPolicy::default(),
        &LinkConfig::default(),
        None,
    );
    assert_eq!(report.failure_count(), 1);
    assert!(report.failures[0].1.contains("modified"));
    assert!(is_regular(&touched));

    let report = deduplicate::<NoProgress>(
        &groups,
        &CanonicalPolicy::default(),
        &LinkConfig::default().with_verify_unchanged(false),
        None,
    );
    assert!(report.all_succeeded());
    assert!(is_symlink(&touched));
}

#[test]
fn test_modified_canonical_keeps_duplicates() {
    let dir = tempdir().unwrap();
    let year = write(dir.path(), "Photos from 2019/a.jpg", b"same");
    let album = write(dir.path(), "Album/a.jpg", b"same");
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    fs::write(&year, b"retouched").unwrap();

    let report = deduplicate::<NoProgress>(
        &groups,
        &CanonicalPolicy::default(),
        &LinkConfig::default(),
        None,
    );
    assert_eq!(report.failure_count(), 1);
    assert!(report.failures[0].1.contains("canonical"));
    assert!(is_regular(&album));
    assert_eq!(fs::read(&album).unwrap(), b"same");
}

#[test]
fn test_long_file_names_are_linked() {
    let dir = tempdir().unwrap();
    let name = format!("{}.jpg", "a".repeat(236));
    let year = write(dir.path(), &format!("Photos from 2019/{name}"), b"same");
    let album = write(dir.path(), &format!("Album/{name}"), b"same");

    let report = dedupe(dir.path(), &LinkConfig::default());

    assert!(report.all_succeeded());
    assert!(is_regular(&year));
    assert!(is_symlink(&album));
    assert_eq!(fs::read(&album).unwrap(), b"same");
}

#[test]
fn test_custom_marker_policy() {
    let dir = tempdir().unwrap();
    let album = write(dir.path(), "Album/a.jpg", b"same");
    let fotos = write(dir.path(), "Fotos de 2019/a.jpg", b"same");
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    deduplicate::<NoProgress>(
        &groups,
        &CanonicalPolicy::new("Fotos de"),
        &LinkConfig::default(),
        None,
    );

    assert!(is_regular(&fotos));
    assert!(is_symlink(&album));
}

#[test]
fn test_same_file_error_variant() {
    let err = LinkError::SameFile(PathBuf::from("/t/a.jpg"));
    assert_eq!(err.path(), Path::new("/t/a.jpg"));
}
