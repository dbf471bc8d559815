use dupescan::duplicates::{AddressSpace, DuplicateFinder, FinderConfig, RootStatus};
use dupescan::scanner::{HashAlgorithm, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let report = DuplicateFinder::with_defaults().scan_path(dir.path()).unwrap();

    assert_eq!(report.total_count, 0);
    assert_eq!(report.unique_count, 0);
    assert!(!report.has_duplicates());
    assert_eq!(report.roots.len(), 1);
    assert_eq!(report.roots[0].status, RootStatus::Completed);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let report = DuplicateFinder::with_defaults().scan_path(dir.path()).unwrap();

    assert_eq!(report.unique_count, 3);
    assert_eq!(report.duplicate_count, 0);
    assert!(report.hash_duplicate_groups.is_empty());
}

#[test]
fn test_two_identical_one_distinct() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("A");
    let b = dir.path().join("B");
    write(&a, &[0x11; 16]);
    write(&b, &[0x11; 16]);
    write(&dir.path().join("C"), &[0x22; 16]);

    let report = DuplicateFinder::with_defaults().scan_path(dir.path()).unwrap();

    assert_eq!(report.unique_count, 2);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(report.failure_count, 0);
    assert_eq!(report.total_count, 3);

    assert_eq!(report.hash_duplicate_groups.len(), 1);
    let (key, paths) = report.hash_duplicate_groups.iter().next().unwrap();
    assert_eq!(key.len(), 32);
    assert_eq!(paths.len(), 2);
    assert!(paths.contains(&a));
    assert!(paths.contains(&b));
}

#[test]
fn test_nested_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("one/two/three/deep.bin"), b"same bytes");
    write(&dir.path().join("top.bin"), b"same bytes");
    write(&dir.path().join("one/other.bin"), b"same bytes");

    let report = DuplicateFinder::with_defaults().scan_path(dir.path()).unwrap();

    assert_eq!(report.unique_count, 1);
    assert_eq!(report.duplicate_count, 2);
    let group = report.hash_duplicate_groups.values().next().unwrap();
    assert_eq!(group.len(), 3);
}

#[test]
fn test_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1")).unwrap();
    File::create(dir.path().join("empty2")).unwrap();

    let report = DuplicateFinder::with_defaults().scan_path(dir.path()).unwrap();

    assert_eq!(report.unique_count, 1);
    assert_eq!(report.duplicate_count, 1);
    assert!(report
        .hash_duplicate_groups
        .contains_key("d41d8cd98f00b204e9800998ecf8427e"));
}

#[test]
fn test_same_grouping_for_every_algorithm() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("x1"), b"xxxx");
    write(&dir.path().join("x2"), b"xxxx");
    write(&dir.path().join("y"), b"yyyy");

    for algorithm in HashAlgorithm::ALL {
        let config = FinderConfig::default().with_algorithm(algorithm);
        let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

        assert_eq!(report.unique_count, 2, "{algorithm}");
        assert_eq!(report.duplicate_count, 1, "{algorithm}");
        let key = report.hash_duplicate_groups.keys().next().unwrap();
        assert_eq!(key.len(), algorithm.digest_len() * 2, "{algorithm}");
    }
}

#[test]
fn test_oversized_files_grouped_by_size() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("big1"), &[1u8; 64]);
    write(&dir.path().join("big2"), &[2u8; 64]);
    write(&dir.path().join("small1"), b"tiny");
    write(&dir.path().join("small2"), b"tiny");

    let config = FinderConfig::default().with_oversize_threshold(32);
    let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

    // Different contents, same size: grouped without comparing bytes.
    assert_eq!(report.size_duplicate_groups.len(), 1);
    assert_eq!(report.size_duplicate_groups["64"].len(), 2);
    assert_eq!(report.hash_duplicate_groups.len(), 1);
    assert_eq!(report.unique_count, 2);
    assert_eq!(report.duplicate_count, 2);
}

#[test]
fn test_file_at_threshold_is_hashed() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), &[7u8; 32]);
    write(&dir.path().join("b"), &[7u8; 32]);

    let config = FinderConfig::default().with_oversize_threshold(32);
    let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

    assert!(report.size_duplicate_groups.is_empty());
    assert_eq!(report.groups(AddressSpace::Hash).len(), 1);
}

#[cfg(unix)]
#[test]
fn test_sparse_file_above_default_threshold() {
    let dir = tempdir().unwrap();
    let big = dir.path().join("big.img");
    let file = File::create(&big).unwrap();
    // Sparse: no data blocks are written.
    file.set_len(3 * 1024 * 1024 * 1024).unwrap();
    drop(file);
    write(&dir.path().join("small"), b"small");

    let config = FinderConfig::default().with_oversize_threshold(2 * 1024 * 1024 * 1024);
    let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

    assert_eq!(report.total_count, 2);
    assert_eq!(report.unique_count, 2);
    assert_eq!(report.failure_count, 0);
    assert!(report.size_duplicate_groups.is_empty());
}

#[test]
fn test_rendezvous_queue_single_worker() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write(&dir.path().join(format!("f{i}")), format!("{}", i % 4).as_bytes());
    }

    let config = FinderConfig::default()
        .with_worker_count(1)
        .with_queue_capacity(0);
    let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

    assert_eq!(report.total_count, 40);
    assert_eq!(report.unique_count, 4);
    assert_eq!(report.duplicate_count, 36);
    assert_eq!(report.roots[0].files, 40);
    assert!(report.roots[0].inline_tasks <= 40);
}

#[test]
fn test_many_workers_large_queue() {
    let dir = tempdir().unwrap();
    for i in 0..100 {
        write(&dir.path().join(format!("d{}/f{i}", i % 7)), format!("{}", i % 10).as_bytes());
    }

    let config = FinderConfig::default()
        .with_worker_count(8)
        .with_queue_capacity(1024);
    let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

    assert_eq!(report.total_count, 100);
    assert_eq!(report.unique_count, 10);
    assert_eq!(report.hash_duplicate_groups.len(), 10);
}

#[test]
fn test_root_is_single_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("only.txt");
    write(&file, b"alone");

    let report = DuplicateFinder::with_defaults().scan_path(&file).unwrap();

    assert_eq!(report.total_count, 1);
    assert_eq!(report.unique_count, 1);
    assert_eq!(report.roots[0].files, 1);
}

#[test]
fn test_ignore_and_hidden_filters() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("keep1.txt"), b"dup");
    write(&dir.path().join("keep2.txt"), b"dup");
    write(&dir.path().join("skip.tmp"), b"dup");
    write(&dir.path().join(".hidden/inner.txt"), b"dup");
    write(&dir.path().join("node_modules/pkg.txt"), b"dup");

    let walker_config = WalkerConfig::default()
        .with_skip_hidden(true)
        .with_ignore_pattern("*.tmp")
        .with_ignore_pattern("node_modules/");
    let config = FinderConfig::default().with_walker_config(walker_config);
    let report = DuplicateFinder::new(config).scan_path(dir.path()).unwrap();

    assert_eq!(report.total_count, 2);
    assert_eq!(report.duplicate_count, 1);
}

#[test]
fn test_repeat_scan_is_identical() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"1");
    write(&dir.path().join("b"), b"1");
    write(&dir.path().join("c"), b"2");

    let finder = DuplicateFinder::with_defaults();
    let first = finder.scan_path(dir.path()).unwrap();
    let second = finder.scan_path(dir.path()).unwrap();

    assert_eq!(first.unique_count, second.unique_count);
    assert_eq!(first.duplicate_count, second.duplicate_count);
    assert_eq!(first.hash_duplicate_groups, second.hash_duplicate_groups);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_counted_as_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.txt");
    write(&locked, b"secret");
    write(&dir.path().join("open.txt"), b"public");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores file permissions.
    if File::open(&locked).is_ok() {
        return;
    }

    let report = DuplicateFinder::with_defaults().scan_path(dir.path()).unwrap();

    assert_eq!(report.failure_count, 1);
    assert_eq!(report.unique_count, 1);
    assert_eq!(report.total_count, 2);
    assert_eq!(report.failures[0].path, locked);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
