//! Working tree enumeration
//!
//! [`TreeScanner`] walks a directory and yields every regular file beneath it as a
//! `/`-separated path relative to the scanned root. Commit, status, restore and
//! diff all go through the same scanner so they agree on what "the tree" is.
//!
//! Traversal errors are returned, not skipped: a subtree that cannot be read
//! would otherwise look like a set of deleted files.

use crate::error::{Result, SnapError};
use crate::ignore_policy::IgnorePolicy;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Enumerates tracked files under a root
#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: PathBuf,
    policy: Option<IgnorePolicy>,
}

impl TreeScanner {
    /// Scanner that skips everything `policy` ignores
    pub fn new(root: impl Into<PathBuf>, policy: IgnorePolicy) -> Self {
        Self {
            root: root.into(),
            policy: Some(policy),
        }
    }

    /// Scanner that lists every file, used for snapshot subtrees
    pub fn unfiltered(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: None,
        }
    }

    /// Root being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree in traversal order
    ///
    /// Each call starts a fresh walk, so the sequence can be restarted.
    pub fn iter(&self) -> impl Iterator<Item = Result<String>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) if is_tracked_file(&entry) => Some(relative_key(&self.root, entry.path())),
                Ok(entry) => {
                    trace!("Skipping non-file entry {:?}", entry.path());
                    None
                }
                Err(e) => Some(Err(SnapError::from(e))),
            })
    }

    /// Walk the whole tree and return paths sorted lexicographically
    pub fn scan(&self) -> Result<Vec<String>> {
        let mut files = self.iter().collect::<Result<Vec<_>>>()?;
        files.sort();
        debug!("Scanned {} files under {:?}", files.len(), self.root);
        Ok(files)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        match (&self.policy, entry.file_name().to_str()) {
            (Some(policy), Some(name)) => policy.is_ignored(name),
            _ => false,
        }
    }
}

/// Regular files, plus symlinks that resolve to one
fn is_tracked_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

/// Convert `path` under `root` into a `/`-separated manifest key
pub fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        SnapError::internal(format!("Path {:?} is not under {:?}", path, root))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| SnapError::PathConversion(part.to_os_string()))?;
                parts.push(part);
            }
            other => {
                return Err(SnapError::internal(format!(
                    "Unexpected path component {:?} in {:?}",
                    other, relative
                )))
            }
        }
    }
    Ok(parts.join("/"))
}
