use dupescan::duplicates::{DuplicateFinder, FinderConfig, FinderError, RootStatus};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_duplicates_across_roots() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    write(&dir1.path().join("photo.jpg"), b"jpeg bytes");
    write(&dir2.path().join("backup/photo.jpg"), b"jpeg bytes");
    write(&dir2.path().join("notes.txt"), b"notes");

    let roots = vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()];
    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();

    assert_eq!(report.total_count, 3);
    assert_eq!(report.unique_count, 2);
    assert_eq!(report.duplicate_count, 1);

    let group = report.hash_duplicate_groups.values().next().unwrap();
    assert!(group.contains(&dir1.path().join("photo.jpg")));
    assert!(group.contains(&dir2.path().join("backup/photo.jpg")));
}

#[test]
fn test_outcomes_follow_input_order() {
    let dirs: Vec<_> = (0..4).map(|_| tempdir().unwrap()).collect();
    for (i, dir) in dirs.iter().enumerate() {
        for j in 0..=i {
            write(&dir.path().join(format!("f{j}")), format!("{i}-{j}").as_bytes());
        }
    }

    let roots: Vec<PathBuf> = dirs.iter().rev().map(|d| d.path().to_path_buf()).collect();
    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();

    assert_eq!(report.roots.len(), 4);
    for (outcome, root) in report.roots.iter().zip(&roots) {
        assert_eq!(&outcome.path, root);
        assert!(outcome.is_completed());
    }
    let files: Vec<usize> = report.roots.iter().map(|o| o.files).collect();
    assert_eq!(files, vec![4, 3, 2, 1]);
    assert_eq!(report.total_count, 10);
}

#[test]
fn test_missing_root_among_present_ones() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");
    let missing = dir.path().join("does-not-exist");

    let roots = vec![missing.clone(), dir.path().to_path_buf()];
    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();

    assert!(report.is_partial());
    assert_eq!(report.roots[0].status, RootStatus::PathNotFound);
    assert_eq!(report.roots[0].path, missing);
    assert_eq!(report.roots[1].status, RootStatus::Completed);
    assert_eq!(report.missing_roots().collect::<Vec<_>>(), vec![missing.as_path()]);
    assert_eq!(report.duplicate_count, 1);
}

#[test]
fn test_all_roots_missing_fails() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("gone1");
    let roots = vec![first.clone(), dir.path().join("gone2")];

    match DuplicateFinder::with_defaults().scan(&roots) {
        Err(FinderError::PathNotFound(path)) => assert_eq!(path, first),
        other => panic!("Expected PathNotFound, got {other:?}"),
    }
}

#[test]
fn test_strict_mode_rejects_missing_root() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"a");
    let missing = dir.path().join("gone");

    let finder = DuplicateFinder::new(FinderConfig::default().with_strict(true));
    let result = finder.scan(&[dir.path().to_path_buf(), missing.clone()]);

    match result {
        Err(FinderError::PathNotFound(path)) => assert_eq!(path, missing),
        other => panic!("Expected PathNotFound, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_inaccessible_root_is_reported_separately() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("data/a"), b"same");
    write(&dir.path().join("data/b"), b"same");
    write(&dir.path().join("plain.txt"), b"x");
    let blocked = dir.path().join("plain.txt/inner");
    let missing = dir.path().join("gone");

    let roots = vec![blocked.clone(), missing.clone(), dir.path().join("data")];
    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();

    assert_eq!(report.roots[0].status, RootStatus::Unreadable);
    assert_eq!(report.roots[1].status, RootStatus::PathNotFound);
    assert_eq!(report.roots[2].status, RootStatus::Completed);
    assert_eq!(report.missing_roots().collect::<Vec<_>>(), vec![missing.as_path()]);
    assert_eq!(report.unreadable_roots().collect::<Vec<_>>(), vec![blocked.as_path()]);
    assert_eq!(report.duplicate_count, 1);
    assert!(report.is_partial());
}

#[test]
fn test_no_roots_gives_empty_report() {
    let report = DuplicateFinder::with_defaults().scan(&[]).unwrap();

    assert_eq!(report.total_count, 0);
    assert!(report.roots.is_empty());
    assert!(!report.has_duplicates());
}

#[test]
fn test_same_root_twice() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"one");
    write(&dir.path().join("b"), b"two");

    let roots = vec![dir.path().to_path_buf(), dir.path().to_path_buf()];
    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();

    // Each path is seen twice; groups still hold distinct paths only.
    assert_eq!(report.unique_count, 2);
    assert_eq!(report.duplicate_count, 2);
    assert_eq!(report.hash_duplicate_groups.len(), 2);
    for group in report.hash_duplicate_groups.values() {
        assert_eq!(group.len(), 1);
    }
}

#[test]
fn test_rendezvous_queue_with_many_roots() {
    let dirs: Vec<_> = (0..6).map(|_| tempdir().unwrap()).collect();
    for dir in &dirs {
        for j in 0..10 {
            write(&dir.path().join(format!("f{j}")), format!("{j}").as_bytes());
        }
    }

    let roots: Vec<PathBuf> = dirs.iter().map(|d| d.path().to_path_buf()).collect();
    let config = FinderConfig::default()
        .with_worker_count(2)
        .with_queue_capacity(0);
    let report = DuplicateFinder::new(config).scan(&roots).unwrap();

    assert_eq!(report.total_count, 60);
    assert_eq!(report.unique_count, 10);
    assert_eq!(report.duplicate_count, 50);
    for group in report.hash_duplicate_groups.values() {
        assert_eq!(group.len(), 6);
    }
}
