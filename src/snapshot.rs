//! Snapshot store
//!
//! Every commit gets a full copy of the tracked files under
//! `<meta>/snapshots/<version>/`, mirroring their relative paths. Subtrees are
//! created once and never modified afterwards.
//!
//! The directory contents, not the manifest's `file_map`, are the authority on
//! which files a version holds: restore and diff enumerate the subtree itself
//! through [`SnapshotStore::list_files`].

use crate::error::{Result, SnapError};
use crate::scanner::TreeScanner;
use crate::utils;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Reject tags that cannot safely be used as a single directory name
pub fn validate_tag(tag: &str) -> Result<()> {
    let invalid = tag.is_empty()
        || tag == "."
        || tag == ".."
        || tag.contains(['/', '\\', '\0']);
    if invalid {
        return Err(SnapError::InvalidVersionTag(tag.to_string()));
    }
    Ok(())
}

/// Full-copy snapshot storage rooted at `<meta>/snapshots`
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding one subtree per version
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Subtree for `tag`
    pub fn subtree(&self, tag: &str) -> PathBuf {
        self.dir.join(tag)
    }

    /// Whether a subtree exists for `tag`
    pub fn exists(&self, tag: &str) -> bool {
        validate_tag(tag).is_ok() && self.subtree(tag).is_dir()
    }

    /// Copy `files` (relative to `source_root`) into a new subtree for `tag`
    ///
    /// Returns the number of bytes copied. Modification times are carried over.
    ///
    /// # Errors
    ///
    /// - [`SnapError::InvalidVersionTag`] if `tag` is not a plain directory name
    /// - [`SnapError::DuplicateVersion`] if the subtree already exists
    /// - [`SnapError::FileUnreadable`] if a source file cannot be read; the partial
    ///   subtree is removed before returning
    pub fn materialize(&self, tag: &str, source_root: &Path, files: &[String]) -> Result<u64> {
        validate_tag(tag)?;
        fs::create_dir_all(&self.dir)?;

        let subtree = self.subtree(tag);
        match fs::create_dir(&subtree) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SnapError::DuplicateVersion(tag.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        match copy_all(source_root, &subtree, files) {
            Ok(bytes) => {
                info!("Materialized snapshot {} ({} files, {} bytes)", tag, files.len(), bytes);
                Ok(bytes)
            }
            Err(e) => {
                self.discard(tag);
                Err(e)
            }
        }
    }

    /// All files present in the subtree for `tag`, sorted
    ///
    /// # Errors
    ///
    /// - [`SnapError::SnapshotMissing`] if there is no subtree for `tag`
    pub fn list_files(&self, tag: &str) -> Result<Vec<String>> {
        if !self.exists(tag) {
            return Err(SnapError::SnapshotMissing(tag.to_string()));
        }
        TreeScanner::unfiltered(self.subtree(tag)).scan()
    }

    /// Path of `relative` inside the subtree for `tag`
    pub fn file_path(&self, tag: &str, relative: &str) -> PathBuf {
        self.subtree(tag).join(relative)
    }

    /// Open `relative` inside the snapshot; `Ok(None)` if the snapshot lacks it
    pub fn open(&self, tag: &str, relative: &str) -> Result<Option<File>> {
        if !self.exists(tag) {
            return Err(SnapError::SnapshotMissing(tag.to_string()));
        }
        let path = self.file_path(tag, relative);
        match File::open(&path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapError::unreadable(path, e)),
        }
    }

    /// Best-effort removal of a subtree that must not stay behind
    pub fn discard(&self, tag: &str) {
        let subtree = self.subtree(tag);
        match fs::remove_dir_all(&subtree) {
            Ok(()) => debug!("Discarded snapshot subtree {:?}", subtree),
            Err(e) => warn!("Failed to discard snapshot subtree {:?}: {}", subtree, e),
        }
    }
}

fn copy_all(source_root: &Path, subtree: &Path, files: &[String]) -> Result<u64> {
    let mut bytes = 0;
    for relative in files {
        trace!("Copying {}", relative);
        bytes += utils::copy_preserving_mtime(&source_root.join(relative), &subtree.join(relative))?;
    }
    Ok(bytes)
}
