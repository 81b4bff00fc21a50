use gphotos_dedupe::duplicates::{DuplicateFinder, FinderConfig, FingerprintGroup};
use gphotos_dedupe::scanner::{Hasher, WalkerConfig};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_every_file_lands_in_exactly_one_group() {
    let dir = tempdir().unwrap();
    let written = vec![
        write(dir.path(), "Photos from 2019/IMG_0001.jpg", b"beach"),
        write(dir.path(), "Photos from 2019/IMG_0002.jpg", b"mountain"),
        write(dir.path(), "Summer/IMG_0001.jpg", b"beach"),
        write(dir.path(), "Hiking/IMG_0002.jpg", b"mountain"),
        write(dir.path(), "Hiking/IMG_0002(1).jpg", b"mountain"),
        write(dir.path(), "Photos from 2020/IMG_0100.jpg", b"city"),
    ];

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_groups(dir.path())
        .unwrap();

    let grouped: Vec<PathBuf> = groups.iter().flat_map(FingerprintGroup::paths).collect();
    let unique: HashSet<&PathBuf> = grouped.iter().collect();
    assert_eq!(grouped.len(), written.len());
    assert_eq!(unique.len(), written.len());
    for path in &written {
        assert!(unique.contains(path), "missing {}", path.display());
    }

    let hasher = Hasher::new();
    for group in &groups {
        let first = fs::read(&group.files[0].path).unwrap();
        for file in &group.files {
            assert_eq!(fs::read(&file.path).unwrap(), first);
            assert_eq!(hasher.full_hash(&file.path).unwrap(), group.fingerprint);
        }
    }

    assert_eq!(groups.len(), 3);
    assert_eq!(summary.duplicate_groups, 2);
    assert_eq!(summary.duplicate_files, 3);
    assert_eq!(summary.reclaimable_space, 5 + 8 + 8);
}

#[test]
fn test_members_follow_sorted_traversal_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Zebra/a.jpg", b"same");
    write(dir.path(), "Alpha/a.jpg", b"same");
    write(dir.path(), "Middle/a.jpg", b"same");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let parents: Vec<String> = groups[0]
        .files
        .iter()
        .map(|f| {
            f.path
                .parent()
                .unwrap()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(parents, vec!["Alpha", "Middle", "Zebra"]);
}

#[test]
fn test_empty_files_are_grouped_unless_skipped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/empty.json", b"");
    write(dir.path(), "b/empty.json", b"");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(false, true));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_hidden_entries_skipped_when_configured() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a/photo.jpg", b"same");
    write(dir.path(), ".trash/photo.jpg", b"same");

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(true, false));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_no_duplicates_in_distinct_archive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Photos from 2019/a.jpg", b"1");
    write(dir.path(), "Photos from 2019/b.jpg", b"2");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_same_name_different_content_not_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Photos from 2019/IMG_0001.jpg", b"first camera");
    write(dir.path(), "Photos from 2020/IMG_0001.jpg", b"second camera");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
}

#[test]
#[cfg(unix)]
fn test_pre_existing_symlinks_are_skipped() {
    let dir = tempdir().unwrap();
    let real = write(dir.path(), "Photos from 2019/a.jpg", b"same");
    fs::create_dir_all(dir.path().join("Album")).unwrap();
    std::os::unix::fs::symlink("../Photos from 2019/a.jpg", dir.path().join("Album/a.jpg"))
        .unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("absolute.jpg")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_groups(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), vec![real]);
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.skipped_entries, 2);
}

#[test]
#[cfg(unix)]
fn test_symlinked_directories_not_followed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Photos from 2019/a.jpg", b"same");
    std::os::unix::fs::symlink("Photos from 2019", dir.path().join("Mirror")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}
