//! Property-based testing for snapvc
//!
//! Uses proptest to check the repository invariants over randomly generated
//! working trees and edit sequences.

use ::snapvc::*;
use proptest::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Strategy for generating file operations
#[derive(Debug, Clone)]
pub enum FileOperation {
    Create { path: PathBuf, content: Vec<u8> },
    Modify { path: PathBuf, content: Vec<u8> },
    Delete { path: PathBuf },
}

fn file_operation_strategy() -> impl Strategy<Value = FileOperation> {
    prop_oneof![
        (path_strategy(), content_strategy())
            .prop_map(|(path, content)| FileOperation::Create { path, content }),
        (path_strategy(), content_strategy())
            .prop_map(|(path, content)| FileOperation::Modify { path, content }),
        path_strategy().prop_map(|path| FileOperation::Delete { path }),
    ]
}

/// Directory and file names never overlap, so a path can't be both
fn path_strategy() -> impl Strategy<Value = PathBuf> {
    let dirs = prop::collection::vec("dir[0-9]", 0..=3);
    let filename = prop_oneof!["file[0-9]{1,2}\\.txt", "[a-z]{1,6}\\.(rs|md)"];
    (dirs, filename).prop_map(|(dirs, filename)| {
        let mut path = PathBuf::new();
        for dir in dirs {
            path.push(dir);
        }
        path.join(filename)
    })
}

fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        "[a-zA-Z0-9 \n]{0,500}".prop_map(|s| s.into_bytes()),
        prop::collection::vec(any::<u8>(), 1..2000),
    ]
}

fn apply_operation(root: &Path, op: &FileOperation) -> std::io::Result<()> {
    match op {
        FileOperation::Create { path, content } => {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(full_path, content)?;
        }
        FileOperation::Modify { path, content } => {
            let full_path = root.join(path);
            if full_path.exists() {
                fs::write(full_path, content)?;
            }
        }
        FileOperation::Delete { path } => {
            let full_path = root.join(path);
            if full_path.exists() {
                fs::remove_file(full_path)?;
            }
        }
    }
    Ok(())
}

/// Relative path -> SHA-256 hex of every file outside the metadata directory
fn digest_tree(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".snapvc")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap();
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_str().unwrap())
                .collect::<Vec<_>>()
                .join("/");
            let digest = hex::encode(Sha256::digest(fs::read(e.path()).unwrap()));
            (key, digest)
        })
        .collect()
}

fn file_map_as_hex(record: &CommitRecord) -> BTreeMap<String, String> {
    record
        .file_map
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().to_string()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The recorded file map is exactly what a fresh scan and hash would produce
    #[test]
    fn commit_records_tree_digests(
        operations in prop::collection::vec(file_operation_strategy(), 1..40)
    ) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        for op in &operations {
            apply_operation(temp_dir.path(), op).unwrap();
        }

        let record = repo.commit("prop", Some("v1")).unwrap();
        prop_assert_eq!(file_map_as_hex(&record), digest_tree(temp_dir.path()));
    }

    /// Forced restore reproduces the committed tree regardless of later edits
    #[test]
    fn commit_restore_identity(
        before in prop::collection::vec(file_operation_strategy(), 1..40),
        after in prop::collection::vec(file_operation_strategy(), 1..40),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        for op in &before {
            apply_operation(temp_dir.path(), op).unwrap();
        }
        let record = repo.commit("base", Some("base")).unwrap();

        for op in &after {
            apply_operation(temp_dir.path(), op).unwrap();
        }
        repo.restore("base", true).unwrap();

        prop_assert_eq!(digest_tree(temp_dir.path()), file_map_as_hex(&record));
        prop_assert!(repo.status().unwrap().unwrap().is_clean());
    }

    /// Status reads only; asking twice gives the same answer
    #[test]
    fn status_is_idempotent(
        before in prop::collection::vec(file_operation_strategy(), 1..30),
        after in prop::collection::vec(file_operation_strategy(), 0..30),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        for op in &before {
            apply_operation(temp_dir.path(), op).unwrap();
        }
        repo.commit("base", None).unwrap();
        for op in &after {
            apply_operation(temp_dir.path(), op).unwrap();
        }

        let first = repo.status().unwrap().unwrap();
        let second = repo.status().unwrap().unwrap();
        prop_assert_eq!(&first, &second);

        let all: Vec<_> = first.modified.iter().chain(&first.added).chain(&first.deleted).collect();
        let distinct: BTreeSet<_> = all.iter().collect();
        prop_assert_eq!(all.len(), distinct.len());
    }

    /// Every commit gets a distinct label, tagged or not
    #[test]
    fn versions_are_unique(tags in prop::collection::vec(prop::option::of("v[0-9]{1,2}"), 1..12)) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        let mut labels = BTreeSet::new();
        for tag in &tags {
            match repo.commit("c", tag.as_deref()) {
                Ok(record) => prop_assert!(labels.insert(record.label().to_string())),
                Err(SnapError::DuplicateVersion(v)) => prop_assert!(labels.contains(&v)),
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
        prop_assert_eq!(repo.log().unwrap().entries.len(), labels.len());
    }
}
