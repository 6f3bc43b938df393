//! Scenario tests for snapvc
//!
//! Each test walks through a complete session the way a user would drive it:
//! commit, edit, inspect, restore.

use ::snapvc::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

#[test]
fn test_init_commit_status_restore() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "a.txt", "hello\n");
    let record = repo.commit("initial", Some("v1")).unwrap();
    assert_eq!(record.label(), "v1");
    assert_eq!(record.file_map.len(), 1);
    assert!(root.join(".snapvc/snapshots/v1/a.txt").is_file());

    write(root, "a.txt", "world\n");
    let status = repo.status().unwrap().unwrap();
    assert_eq!(status.base_version, "v1");
    assert_eq!(status.modified, vec!["a.txt"]);

    let err = repo.restore("v1", false).unwrap_err();
    assert!(matches!(err, SnapError::DirtyWorkingTree { modified: 1, .. }));
    assert_eq!(read(root, "a.txt"), "world\n");

    repo.restore("v1", true).unwrap();
    assert_eq!(read(root, "a.txt"), "hello\n");
    assert!(repo.status().unwrap().unwrap().is_clean());
}

#[test]
fn test_restore_removes_files_added_later() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "keep.txt", "keep");
    repo.commit("one file", Some("v1")).unwrap();

    write(root, "later.txt", "later");
    write(root, "dir/nested.txt", "nested");
    repo.commit("three files", Some("v2")).unwrap();

    let result = repo.restore("v1", false).unwrap();
    assert_eq!(result.files_restored, 1);
    assert!(root.join("keep.txt").exists());
    assert!(!root.join("later.txt").exists());
    assert!(!root.join("dir").exists());

    // The manifest is not rewound
    let labels: Vec<_> = repo.log().unwrap().entries.into_iter().map(|e| e.label).collect();
    assert_eq!(labels, vec!["v2", "v1"]);
}

#[test]
fn test_restore_preserves_mtime() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "a.txt", "x");
    let old = filetime::FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(root.join("a.txt"), old).unwrap();
    repo.commit("c", Some("v1")).unwrap();

    fs::remove_file(root.join("a.txt")).unwrap();
    repo.restore("v1", true).unwrap();

    let meta = fs::metadata(root.join("a.txt")).unwrap();
    assert_eq!(filetime::FileTime::from_last_modification_time(&meta), old);
}

#[test]
fn test_auto_tag_is_usable_everywhere() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "a.txt", "one\n");
    let first = repo.commit("auto", None).unwrap();
    write(root, "a.txt", "two\n");
    let second = repo.commit("auto again", None).unwrap();

    assert_ne!(first.label(), second.label());
    assert!(first.label().chars().take(14).all(|c| c.is_ascii_digit()));

    let history = repo.log().unwrap();
    assert_eq!(history.entries[1].label, first.label());

    let report = repo.diff(Some(first.label()), &DiffOptions::default()).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(matches!(
        report.files[0].kind,
        DiffKind::Modified { lines_added: 1, lines_deleted: 1, .. }
    ));

    repo.restore(first.label(), false).unwrap();
    assert_eq!(read(root, "a.txt"), "one\n");
}

#[test]
fn test_duplicate_tag_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "a.txt", "a");
    repo.commit("first", Some("release")).unwrap();
    write(root, "a.txt", "b");

    let err = repo.commit("second", Some("release")).unwrap_err();
    assert!(matches!(err, SnapError::DuplicateVersion(v) if v == "release"));
    assert_eq!(repo.log().unwrap().entries.len(), 1);
    assert_eq!(
        fs::read_to_string(root.join(".snapvc/snapshots/release/a.txt")).unwrap(),
        "a"
    );
}

#[test]
fn test_diff_against_latest_and_older() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "code.rs", "fn main() {\n    println!(\"a\");\n}\n");
    write(root, "old.txt", "old\n");
    repo.commit("v1", Some("v1")).unwrap();

    write(root, "code.rs", "fn main() {\n    println!(\"b\");\n}\n");
    fs::remove_file(root.join("old.txt")).unwrap();
    write(root, "new.txt", "new\n");
    fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
    repo.commit("v2", Some("v2")).unwrap();
    fs::write(root.join("blob.bin"), [0xff, 0x00]).unwrap();

    // Latest: only the binary edit
    let latest = repo.diff(None, &DiffOptions::default()).unwrap();
    assert_eq!(latest.version, "v2");
    assert_eq!(latest.files.len(), 1);
    assert!(matches!(latest.files[0].kind, DiffKind::Binary));

    let older = repo.diff(Some("v1"), &DiffOptions::default()).unwrap();
    let paths: Vec<_> = older.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["blob.bin", "code.rs", "new.txt", "old.txt"]);
    assert!(matches!(older.files[2].kind, DiffKind::Added));
    assert!(matches!(older.files[3].kind, DiffKind::Deleted));

    let text = diff::render_file("v1", &older.files[1]).unwrap();
    assert!(text.starts_with("--- v1/code.rs\n+++ Current/code.rs\n@@ -1,3 +1,3 @@\n"));
    assert!(text.contains("-    println!(\"a\");\n+    println!(\"b\");\n"));
}

#[test]
fn test_diff_unknown_version() {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();

    assert!(matches!(
        repo.diff(None, &DiffOptions::default()),
        Err(SnapError::NoCommits)
    ));
    assert!(matches!(
        repo.diff(Some("ghost"), &DiffOptions::default()),
        Err(SnapError::VersionNotFound(v)) if v == "ghost"
    ));
}

#[test]
fn test_ignored_entries_untracked_then_wiped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "src/main.rs", "fn main() {}");
    write(root, ".git/HEAD", "ref: refs/heads/main");
    write(root, "src/__pycache__/x.pyc", "bytecode");
    write(root, "node.DS_Store", "not ignored, full name differs");

    let record = repo.commit("c", Some("v1")).unwrap();
    let keys: Vec<_> = record.file_map.keys().cloned().collect();
    assert_eq!(keys, vec!["node.DS_Store", "src/main.rs"]);

    write(root, ".git/HEAD", "ref: refs/heads/other");
    assert!(repo.status().unwrap().unwrap().is_clean());

    // Only the metadata directory survives the wipe
    write(root, "venv/stale.py", "import os");
    repo.restore("v1", true).unwrap();
    assert!(!root.join(".git").exists());
    assert!(!root.join("venv").exists());
    assert!(!root.join("src/__pycache__").exists());
    assert_eq!(read(root, "src/main.rs"), "fn main() {}");
    assert_eq!(repo.log().unwrap().entries.len(), 1);
}

#[test]
fn test_legacy_manifest_records() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    let legacy = r#"[
  {
    "id": "20240101120000",
    "timestamp": "2024-01-01 12:00:00",
    "message": "from an older tool",
    "file_map": {"a.txt": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"}
  }
]"#;
    fs::write(repo.config().manifest_path(), legacy).unwrap();
    write(root, "a.txt", "hello");

    let history = repo.log().unwrap();
    assert!(history.warning.is_none());
    assert_eq!(history.entries[0].label, "20240101120000");
    assert_eq!(history.entries[0].file_count, 1);

    let status = repo.status().unwrap().unwrap();
    assert_eq!(status.base_version, "20240101120000");
    assert!(status.is_clean());

    // Legacy records carry no tag, so they cannot be restored by id
    assert!(matches!(
        repo.restore("20240101120000", true),
        Err(SnapError::VersionNotFound(_))
    ));
}

#[test]
fn test_open_existing_repository() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    {
        let repo = Repository::init(root).unwrap();
        write(root, "a.txt", "a");
        repo.commit("c", Some("v1")).unwrap();
    }

    let reopened = Repository::open(root).unwrap();
    assert_eq!(reopened.log().unwrap().entries.len(), 1);
    assert!(matches!(
        Repository::init(root),
        Err(SnapError::RepositoryAlreadyExists(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_failed_commit_leaves_no_trace() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "a.txt", "a");
    repo.commit("first", Some("v1")).unwrap();

    write(root, "locked.txt", "secret");
    fs::set_permissions(root.join("locked.txt"), fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(root.join("locked.txt")).is_ok() {
        // Running as root; permissions are not enforced
        return;
    }

    let err = repo.commit("second", Some("v2")).unwrap_err();
    fs::set_permissions(root.join("locked.txt"), fs::Permissions::from_mode(0o644)).unwrap();

    assert!(matches!(err, SnapError::FileUnreadable { .. }));
    let manifest = repo.load_manifest().unwrap();
    assert_eq!(manifest.records.len(), 1);
    assert_eq!(manifest.records[0].label(), "v1");
    assert!(!root.join(".snapvc/snapshots/v2").exists());

    // The tag is still free
    repo.commit("second", Some("v2")).unwrap();
}

#[test]
fn test_dirty_guard_leaves_manifest_alone() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    write(root, "a.txt", "a");
    write(root, "b.txt", "b");
    repo.commit("one", Some("v1")).unwrap();
    write(root, "a.txt", "changed");
    repo.commit("two", Some("v2")).unwrap();

    // Dirty only through a deletion
    fs::remove_file(root.join("b.txt")).unwrap();
    let manifest_before = fs::read(repo.config().manifest_path()).unwrap();

    let err = repo.restore("v1", false).unwrap_err();
    assert!(matches!(
        err,
        SnapError::DirtyWorkingTree { modified: 0, added: 0, deleted: 1 }
    ));
    assert_eq!(fs::read(repo.config().manifest_path()).unwrap(), manifest_before);
    assert_eq!(read(root, "a.txt"), "changed");
    assert!(!root.join("b.txt").exists());
}

#[test]
fn test_diff_large_rewritten_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();

    let original: String = (0..20_000).map(|i| format!("entry {}\n", i)).collect();
    write(root, "big.log", &original);
    repo.commit("log", Some("v1")).unwrap();

    let rewritten: String = (0..20_000).map(|i| format!("ENTRY {}\n", i)).collect();
    write(root, "big.log", &rewritten);

    let report = repo.diff(None, &DiffOptions::default()).unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.line_totals(), (20_000, 20_000));

    let limited = DiffOptions {
        max_file_size: 1024,
        ..Default::default()
    };
    let report = repo.diff(None, &limited).unwrap();
    assert_eq!(report.files[0].kind, DiffKind::TooLarge);
}
