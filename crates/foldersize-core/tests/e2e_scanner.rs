/// End-to-end scanner integration tests.
///
/// These tests run the real worker pool against real temporary directory
/// trees and compare the results with an independent single-threaded walk.
use foldersize_core::model::SizeEntry;
use foldersize_core::scanner::progress::ScanProgress;
use foldersize_core::scanner::{run_scan, start_scan, ScanOptions, ScanResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// ```text
/// root/
///   alpha/
///     a.txt   (100 bytes)
///     b.rs    (200 bytes)
///     nested/
///       n.bin (50 bytes)
///   beta/
///     c.png   (300 bytes)
///   d.zip     (400 bytes)
/// ```
///
/// Total file bytes: 1 050.
fn build_test_tree(root: &Path) {
    let alpha = root.join("alpha");
    let nested = alpha.join("nested");
    let beta = root.join("beta");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(&beta).unwrap();

    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("b.rs"), 200);
    write_bytes(&nested.join("n.bin"), 50);
    write_bytes(&beta.join("c.png"), 300);
    write_bytes(&root.join("d.zip"), 400);
}

/// A wider tree: `width` directories, each with `depth` nested levels and
/// one file per level whose size depends on its position.
fn build_wide_tree(root: &Path, width: usize, depth: usize) {
    for w in 0..width {
        let mut dir = root.join(format!("dir{w:03}"));
        for d in 0..depth {
            fs::create_dir_all(&dir).unwrap();
            write_bytes(&dir.join("f.dat"), 10 * (w + 1) + d);
            dir = dir.join(format!("level{d}"));
        }
    }
}

/// Independent reference: cumulative size of every non-hidden directory.
fn reference_sizes(root: &Path, include_hidden: bool) -> BTreeMap<PathBuf, u64> {
    fn walk(dir: &Path, include_hidden: bool, out: &mut BTreeMap<PathBuf, u64>) -> u64 {
        let mut total = 0;
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            if !include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let ft = entry.file_type().unwrap();
            if ft.is_file() {
                total += entry.metadata().unwrap().len();
            } else if ft.is_dir() {
                total += walk(&entry.path(), include_hidden, out);
            }
        }
        out.insert(dir.to_path_buf(), total);
        total
    }
    let mut out = BTreeMap::new();
    walk(root, include_hidden, &mut out);
    out
}

fn as_map(entries: &[SizeEntry]) -> BTreeMap<PathBuf, u64> {
    entries.iter().map(|e| (e.path.clone(), e.size)).collect()
}

fn scan(root: &Path, workers: usize, include_hidden: bool) -> ScanResult {
    run_scan(
        root,
        ScanOptions {
            worker_count: workers,
            include_hidden,
            ..Default::default()
        },
    )
    .expect("scan failed")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// Root cumulative size equals the sum of every file under the root,
/// and every directory matches an independent reference walk.
#[test]
fn sizes_match_reference_walk() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let result = scan(tmp.path(), 4, false);
    assert!(!result.interrupted);
    assert_eq!(result.root_size(), Some(1_050));
    assert_eq!(result.totals.bytes, 1_050);
    assert_eq!(result.totals.files, 5);
    assert_eq!(result.totals.directories, 4);
    assert_eq!(result.totals.errors, 0);
    assert_eq!(as_map(&result.entries), reference_sizes(tmp.path(), false));

    let alpha = result
        .entries
        .iter()
        .find(|e| e.path == tmp.path().join("alpha"))
        .unwrap();
    assert_eq!(alpha.size, 350);
    assert_eq!(alpha.depth, 1);
}

#[test]
fn entries_are_sorted_by_path() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let result = scan(tmp.path(), 3, false);
    let paths: Vec<&PathBuf> = result.entries.iter().map(|e| &e.path).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
    assert_eq!(paths[0], &tmp.path().to_path_buf());
}

#[test]
fn empty_directory_reports_only_root() {
    let tmp = TempDir::new().unwrap();

    let result = scan(tmp.path(), 2, false);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.root_size(), Some(0));
    assert_eq!(result.totals.files, 0);
    assert_eq!(result.totals.directories, 1);
}

/// `.git/`, `.env` are skipped by default and included with `include_hidden`.
#[test]
fn hidden_entries_are_filtered() {
    let tmp = TempDir::new().unwrap();
    let git = tmp.path().join(".git");
    fs::create_dir_all(&git).unwrap();
    write_bytes(&git.join("HEAD"), 1_000);
    write_bytes(&tmp.path().join(".env"), 20);
    write_bytes(&tmp.path().join("visible.txt"), 5);

    let default = scan(tmp.path(), 2, false);
    assert_eq!(default.root_size(), Some(5));
    assert_eq!(default.totals.files, 1);
    assert!(default.entries.iter().all(|e| e.path != git));

    let all = scan(tmp.path(), 2, true);
    assert_eq!(all.root_size(), Some(1_025));
    assert_eq!(all.totals.files, 3);
    assert!(all.entries.iter().any(|e| e.path == git && e.size == 1_000));
    assert_eq!(as_map(&all.entries), reference_sizes(tmp.path(), true));
}

/// Given `a`, `a/b`, `c`, top-level mode reports exactly root, `a`, `c`.
#[test]
fn top_level_only_keeps_root_and_children() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("a").join("b")).unwrap();
    fs::create_dir_all(root.join("c")).unwrap();
    write_bytes(&root.join("a").join("b").join("deep.bin"), 70);
    write_bytes(&root.join("c").join("x.bin"), 30);

    let result = run_scan(
        root,
        ScanOptions {
            top_level_only: true,
            ..Default::default()
        },
    )
    .unwrap();

    let paths: BTreeSet<PathBuf> = result.entries.iter().map(|e| e.path.clone()).collect();
    let expected: BTreeSet<PathBuf> = [root.to_path_buf(), root.join("a"), root.join("c")]
        .into_iter()
        .collect();
    assert_eq!(paths, expected);
    // Filtering does not change what the sizes include.
    assert_eq!(result.root_size(), Some(100));
    let a = result.entries.iter().find(|e| e.path == root.join("a")).unwrap();
    assert_eq!(a.size, 70);
}

/// One worker and sixteen workers produce the same set of (path, size) pairs.
#[test]
fn worker_count_does_not_change_results() {
    let tmp = TempDir::new().unwrap();
    build_wide_tree(tmp.path(), 24, 5);

    let single = scan(tmp.path(), 1, false);
    let many = scan(tmp.path(), 16, false);

    assert_eq!(as_map(&single.entries), as_map(&many.entries));
    assert_eq!(single.totals, many.totals);
    assert_eq!(single.totals.directories, 1 + 24 * 5);
    assert_eq!(as_map(&many.entries), reference_sizes(tmp.path(), false));
}

/// Symlinks are zero-size leaves and never traversed.
#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    let tmp = TempDir::new().unwrap();
    let real = tmp.path().join("real");
    fs::create_dir_all(&real).unwrap();
    write_bytes(&real.join("data.bin"), 500);
    std::os::unix::fs::symlink(&real, tmp.path().join("link_dir")).unwrap();
    std::os::unix::fs::symlink(real.join("data.bin"), tmp.path().join("link_file")).unwrap();
    // A loop back to the root must not hang the scan.
    std::os::unix::fs::symlink(tmp.path(), real.join("loop")).unwrap();

    let result = scan(tmp.path(), 4, false);
    assert_eq!(result.root_size(), Some(500));
    assert_eq!(result.totals.files, 1);
    assert_eq!(result.entries.len(), 2);
}

/// An unreadable directory still appears (size 0) and does not stop siblings.
#[cfg(unix)]
#[test]
fn unreadable_directory_does_not_halt_scan() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let locked = tmp.path().join("locked");
    let open = tmp.path().join("open");
    fs::create_dir_all(&locked).unwrap();
    fs::create_dir_all(&open).unwrap();
    write_bytes(&locked.join("secret.bin"), 999);
    write_bytes(&open.join("fine.bin"), 10);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users bypass permission bits; nothing to test then.
    let bypassed = fs::read_dir(&locked).is_ok();
    let result = (!bypassed).then(|| scan(tmp.path(), 4, false));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let Some(result) = result else {
        return;
    };

    assert!(!result.interrupted);
    assert_eq!(result.totals.errors, 1);
    let sizes = as_map(&result.entries);
    assert_eq!(sizes.get(&locked), Some(&0));
    assert_eq!(sizes.get(&open), Some(&10));
    assert_eq!(result.root_size(), Some(10));
}

/// Interrupting mid-scan yields a partial result: only listed directories are
/// reported, every one whose whole subtree was listed has exactly its
/// full-scan size, and the root equals the byte counter.
#[test]
fn interrupted_scan_salvages_completed_subtrees() {
    let tmp = TempDir::new().unwrap();
    build_wide_tree(tmp.path(), 200, 8);
    let full = as_map(&scan(tmp.path(), 4, false).entries);

    let handle = start_scan(
        tmp.path().to_path_buf(),
        ScanOptions {
            worker_count: 1,
            ..Default::default()
        },
    )
    .unwrap();

    // Stop once the root listing is committed and its children are queued.
    loop {
        let root_listed = {
            let tree = handle.tree.read();
            tree.find(tmp.path())
                .map(|idx| tree.node(idx).scanned)
                .unwrap_or(false)
        };
        if root_listed || handle.is_finished() {
            break;
        }
        std::thread::yield_now();
    }
    assert!(handle.interrupt(), "scan finished before it could be interrupted");
    let partial = handle.wait().unwrap();

    assert!(partial.interrupted);
    let reported = as_map(&partial.entries);
    assert!(!reported.is_empty());
    assert!(reported.len() < full.len());
    assert!(partial.totals.unscanned_dirs > 0);
    assert_eq!(partial.totals.directories as usize, reported.len());
    assert_eq!(partial.root_size(), Some(partial.totals.bytes));

    for (path, size) in &reported {
        let full_size = full[path];
        assert!(*size <= full_size, "{} grew past its full size", path.display());
        let subtree_complete = full
            .keys()
            .filter(|p| p.starts_with(path))
            .all(|p| reported.contains_key(p));
        if subtree_complete {
            assert_eq!(*size, full_size, "{} is complete but differs", path.display());
        }
    }
}

/// The progress channel delivers a terminal `Complete` after updates.
#[test]
fn progress_channel_reports_completion() {
    let tmp = TempDir::new().unwrap();
    for i in 0..50 {
        write_bytes(&tmp.path().join(format!("file{i:03}.bin")), 1024);
    }

    let handle = start_scan(
        tmp.path().to_path_buf(),
        ScanOptions {
            progress_interval: Duration::from_millis(5),
            ..Default::default()
        },
    )
    .unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    let mut last_files = 0;
    let error_count = loop {
        assert!(
            std::time::Instant::now() < deadline,
            "scanner did not complete within 30 seconds"
        );
        match handle.progress_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(ScanProgress::Update { files_found, .. }) => {
                assert!(files_found >= last_files, "file count went backwards");
                last_files = files_found;
            }
            Ok(ScanProgress::Complete { error_count, .. }) => break error_count,
            Ok(ScanProgress::Interrupted) => panic!("scan was unexpectedly interrupted"),
            Ok(ScanProgress::Error { path, message }) => panic!("unexpected error {path}: {message}"),
            Err(_) => continue,
        }
    };
    assert_eq!(error_count, 0);
    assert!(!handle.is_interrupted());

    let result = handle.wait().unwrap();
    assert_eq!(result.totals.files, 50);
    assert_eq!(result.root_size(), Some(50 * 1024));
}

/// The shared tree stays readable after the scan and matches the result.
#[test]
fn shared_tree_holds_aggregated_sizes() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let handle = start_scan(tmp.path().to_path_buf(), ScanOptions::default()).unwrap();
    let tree = handle.tree.clone();
    let result = handle.wait().unwrap();

    let tree = tree.read();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.scanned_bytes(), result.totals.bytes);
    let root = tree.find(tmp.path()).unwrap();
    assert_eq!(tree.node(root).cumulative_size, Some(1_050));
    assert_eq!(tree.children(root).len(), 2);
}
