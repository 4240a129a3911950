use foldersize_scan::{Inclusion, ScanError, SizeAggregator, SizeConfig, SizeReport, TreeWalker};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Layout used by most tests:
///
/// ```text
/// root/
///   top.bin           10
///   a/                 (1110)
///     a.bin          100
///     deep/           (1010)
///       deep.bin    1000
///       cache/        (10)
///         c.bin      10
///   b/                 (5)
///     b.bin            5
/// ```
fn create_test_tree(root: &Path) {
    fs::create_dir_all(root.join("a/deep/cache")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("top.bin"), vec![0u8; 10]).unwrap();
    fs::write(root.join("a/a.bin"), vec![0u8; 100]).unwrap();
    fs::write(root.join("a/deep/deep.bin"), vec![0u8; 1000]).unwrap();
    fs::write(root.join("a/deep/cache/c.bin"), vec![0u8; 10]).unwrap();
    fs::write(root.join("b/b.bin"), vec![0u8; 5]).unwrap();
}

fn run(root: &Path, max_depth: i32, always_show: &[&str], threshold: Option<u64>) -> SizeReport {
    let config = SizeConfig::builder()
        .root(root)
        .max_depth(max_depth)
        .always_show(always_show.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        .show_large_threshold(threshold)
        .build()
        .unwrap();
    SizeAggregator::new(config).aggregate().unwrap()
}

fn size_of(report: &SizeReport, path: PathBuf) -> Option<u64> {
    report
        .entries
        .iter()
        .find(|e| e.node.path == path)
        .map(|e| e.size)
}

#[test]
fn test_total_is_independent_of_policy() {
    let temp = TempDir::new().unwrap();
    create_test_tree(temp.path());

    for depth in 0..4 {
        for threshold in [None, Some(0), Some(1_000)] {
            let report = run(temp.path(), depth, &["cache"], threshold);
            assert_eq!(report.total, 1125, "depth {depth}, threshold {threshold:?}");
        }
    }
}

#[test]
fn test_depth_zero_lists_direct_children() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    create_test_tree(&root);

    let report = run(&root, 0, &[], None);

    let mut paths: Vec<_> = report.entries.iter().map(|e| e.node.path.clone()).collect();
    paths.sort();
    assert_eq!(paths, vec![root.join("a"), root.join("b"), root.join("top.bin")]);
    assert_eq!(size_of(&report, root.join("a")), Some(1110));
    assert!(report.entries.iter().all(|e| e.inclusion == Inclusion::Depth));
}

#[test]
fn test_default_depth_lists_grandchildren() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    create_test_tree(&root);

    let report = run(&root, 1, &[], None);

    assert_eq!(size_of(&report, root.join("a/deep")), Some(1010));
    assert_eq!(size_of(&report, root.join("a/a.bin")), Some(100));
    assert_eq!(size_of(&report, root.join("a/deep/cache")), None);
    assert_eq!(size_of(&report, root.join("a/deep/deep.bin")), None);
}

#[test]
fn test_always_show_below_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    create_test_tree(&root);

    let report = run(&root, 0, &["cache"], None);

    let cache = report
        .entries
        .iter()
        .find(|e| e.node.path == root.join("a/deep/cache"))
        .expect("cache should be listed");
    assert_eq!(cache.size, 10);
    assert_eq!(cache.inclusion, Inclusion::AlwaysShow);
    // Files are never pulled in by name.
    assert_eq!(size_of(&report, root.join("a/deep/cache/c.bin")), None);
}

#[test]
fn test_large_threshold_uses_full_subtree_size() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    create_test_tree(&root);

    let report = run(&root, 0, &[], Some(1_009));
    let deep = report
        .entries
        .iter()
        .find(|e| e.node.path == root.join("a/deep"))
        .expect("deep exceeds the threshold");
    assert_eq!(deep.inclusion, Inclusion::Large);
    assert_eq!(size_of(&report, root.join("a/deep/cache")), None);

    // Exactly at the threshold is not large.
    let report = run(&root, 0, &[], Some(1_010));
    assert_eq!(size_of(&report, root.join("a/deep")), None);
}

#[test]
fn test_entries_sorted_descending() {
    let temp = TempDir::new().unwrap();
    create_test_tree(temp.path());

    let report = run(temp.path(), 3, &[], None);
    assert!(report.entries.windows(2).all(|w| w[0].size >= w[1].size));
    assert_eq!(report.dirs, 5);
    assert_eq!(report.files, 5);
}

#[test]
fn test_negative_depth_lists_only_named_and_large() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    create_test_tree(&root);

    let report = run(&root, -1, &["cache"], Some(1_009));

    let mut listed: Vec<_> = report
        .entries
        .iter()
        .map(|e| (e.node.path.clone(), e.inclusion))
        .collect();
    listed.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        listed,
        vec![
            (root.join("a"), Inclusion::Large),
            (root.join("a/deep"), Inclusion::Large),
            (root.join("a/deep/cache"), Inclusion::AlwaysShow),
        ]
    );
    assert_eq!(report.total, 1125);
}

#[test]
fn test_equal_sizes_keep_walk_order() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    for name in ["first.bin", "second.bin", "third.bin", "fourth.bin"] {
        fs::write(root.join(name), vec![0u8; 7]).unwrap();
    }
    fs::write(root.join("big.bin"), vec![0u8; 50]).unwrap();

    let mut walked = Vec::new();
    TreeWalker::new()
        .walk_with(&root, |_| {}, |f| {
            if f.len == 7 {
                walked.push(f.path.clone());
            }
        })
        .unwrap();

    let report = run(&root, 0, &[], None);
    assert_eq!(report.entries[0].node.path, root.join("big.bin"));
    let tied: Vec<_> = report.entries[1..].iter().map(|e| e.node.path.clone()).collect();
    assert_eq!(tied, walked);
}

#[test]
fn test_text_report_layout() {
    let temp = TempDir::new().unwrap();
    create_test_tree(temp.path());

    let report = run(temp.path(), 0, &[], None);
    let lines = report.lines(false);
    let sep = std::path::MAIN_SEPARATOR;

    assert!(lines[0].starts_with("total "));
    assert!(lines[0].contains("| 1.1        KB"));
    assert!(lines[1].is_empty());
    assert!(lines[2].starts_with(&format!("a{sep} ")));
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().filter(|l| !l.is_empty()).all(|l| l.find('|') == Some(51)));
}

#[test]
fn test_empty_root() {
    let temp = TempDir::new().unwrap();

    let report = run(temp.path(), 1, &[], Some(0));
    assert_eq!(report.total, 0);
    assert!(report.entries.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let config = SizeConfig::new(temp.path().join("missing"));

    let result = SizeAggregator::new(config).aggregate();
    assert!(matches!(result, Err(ScanError::NotFound { .. })));
}

#[test]
fn test_file_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let result = TreeWalker::new().walk_with(&file, |_| {}, |_| {});
    assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subtree_counts_zero() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    create_test_tree(temp.path());
    let locked = temp.path().join("b");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root bypasses permission checks, so only assert when the lock holds.
    let locked_for_us = fs::read_dir(&locked).is_err();
    let report = run(temp.path(), 1, &[], None);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if locked_for_us {
        assert_eq!(report.total, 1120);
        assert!(!report.warnings.is_empty());
    } else {
        assert_eq!(report.total, 1125);
    }
}
