//! The repository and its engines
//!
//! [`Repository`] ties the stores together and exposes the user-level
//! operations:
//!
//! - [`commit`](Repository::commit): the only writer of snapshots and manifest
//! - [`status`](Repository::status): working tree vs. the last commit
//! - [`restore`](Repository::restore): guarded by the same comparison, then destructive
//! - [`diff`](Repository::diff): line diffs against any snapshot
//! - [`log`](Repository::log): history, newest first
//!
//! All state lives on disk; a `Repository` is just its [`RepoConfig`] plus the
//! stores derived from it, so every method takes `&self`.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use snapvc::{DiffOptions, Repository};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::init("./project")?;
//! repo.commit("initial", Some("v1"))?;
//!
//! // ... edit files ...
//!
//! if let Some(status) = repo.status()? {
//!     println!("{} paths changed since {}", status.total_changes(), status.base_version);
//! }
//! let report = repo.diff(Some("v1"), &DiffOptions::default())?;
//! repo.restore("v1", true)?;
//! # Ok(())
//! # }
//! ```

use crate::config::{RepoConfig, RepositoryBuilder};
use crate::diff;
use crate::error::{Result, SnapError};
use crate::hasher;
use crate::ignore_policy::IgnorePolicy;
use crate::manifest::{LoadedManifest, ManifestStore};
use crate::scanner::TreeScanner;
use crate::snapshot::{self, SnapshotStore};
use crate::types::*;
use crate::utils;
use chrono::Local;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A snapshot-versioned directory tree
#[derive(Debug, Clone)]
pub struct Repository {
    config: RepoConfig,
    policy: IgnorePolicy,
    manifest: ManifestStore,
    snapshots: SnapshotStore,
}

impl Repository {
    /// Create a repository at `root` with default settings
    ///
    /// # Errors
    ///
    /// - [`SnapError::RepositoryAlreadyExists`] if `root` already has a metadata directory
    /// - [`SnapError::Io`] if `root` does not exist or the metadata cannot be written
    pub fn init(root: impl AsRef<Path>) -> Result<Self> {
        RepositoryBuilder::new().init(root)
    }

    /// Open the repository at `root` with default settings
    ///
    /// # Errors
    ///
    /// - [`SnapError::RepositoryNotFound`] if `root` has no metadata directory
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        RepositoryBuilder::new().open(root)
    }

    #[instrument]
    pub(crate) fn init_with_config(config: RepoConfig) -> Result<Self> {
        let meta_dir = config.meta_dir();
        if meta_dir.exists() {
            return Err(SnapError::RepositoryAlreadyExists(config.root));
        }

        let repo = Self::from_config(config);
        fs::create_dir(&meta_dir)?;
        fs::create_dir(repo.snapshots.dir())?;
        repo.manifest.save(&[])?;

        info!("Initialized repository in {:?}", repo.config.root);
        Ok(repo)
    }

    pub(crate) fn open_with_config(config: RepoConfig) -> Result<Self> {
        if !config.meta_dir().is_dir() {
            return Err(SnapError::RepositoryNotFound(config.root));
        }
        debug!("Opened repository at {:?}", config.root);
        Ok(Self::from_config(config))
    }

    fn from_config(config: RepoConfig) -> Self {
        Self {
            policy: config.ignore_policy(),
            manifest: ManifestStore::new(config.manifest_path()),
            snapshots: SnapshotStore::new(config.snapshots_dir()),
            config,
        }
    }

    /// Configuration this repository was opened with
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Root of the working tree
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Snapshot storage
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Read the manifest, including any corruption warning
    pub fn load_manifest(&self) -> Result<LoadedManifest> {
        self.manifest.load()
    }

    fn scan_working_tree(&self) -> Result<Vec<String>> {
        TreeScanner::new(&self.config.root, self.policy.clone()).scan()
    }

    /// Record a new version of the working tree
    ///
    /// Copies every tracked file into a new snapshot subtree, then appends a
    /// [`CommitRecord`] to the manifest. Without `version`, a tag is derived from
    /// the current time. The manifest is written only after the snapshot is
    /// complete; on any failure the partial subtree is removed again.
    ///
    /// # Errors
    ///
    /// - [`SnapError::DuplicateVersion`] if `version` is already recorded
    /// - [`SnapError::InvalidVersionTag`] if `version` is not a plain directory name
    /// - [`SnapError::FileUnreadable`] if a tracked file cannot be read
    #[instrument(skip(self))]
    pub fn commit(&self, message: &str, version: Option<&str>) -> Result<CommitRecord> {
        let start = Instant::now();
        let manifest = self.manifest.load()?;

        let now = Local::now();
        let token = now.format("%Y%m%d%H%M%S").to_string();
        let id = unique_token(&token, |c| manifest.records.iter().any(|r| r.id == c));
        let version = match version {
            Some(tag) => {
                snapshot::validate_tag(tag)?;
                if manifest.contains_version(tag) {
                    return Err(SnapError::DuplicateVersion(tag.to_string()));
                }
                tag.to_string()
            }
            None => unique_token(&token, |c| {
                manifest.contains_version(c) || self.snapshots.exists(c)
            }),
        };

        let files = self.scan_working_tree()?;
        let bytes = self
            .snapshots
            .materialize(&version, &self.config.root, &files)?;

        let persisted = self.hash_snapshot(&version, &files).and_then(|file_map| {
            let record = CommitRecord {
                version: Some(version.clone()),
                id,
                timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
                message: message.to_string(),
                file_map,
            };
            let mut records = manifest.records;
            records.push(record.clone());
            self.manifest.save(&records)?;
            Ok(record)
        });

        match persisted {
            Ok(record) => {
                info!(
                    "Committed {} ({} files, {}) in {:?}",
                    version,
                    record.file_count(),
                    utils::format_bytes(bytes),
                    start.elapsed()
                );
                Ok(record)
            }
            Err(e) => {
                warn!("Commit of {} failed, discarding snapshot: {}", version, e);
                self.snapshots.discard(&version);
                Err(e)
            }
        }
    }

    /// Digests are taken from the snapshot copies, so they describe exactly what was stored
    fn hash_snapshot(&self, version: &str, files: &[String]) -> Result<FileMap> {
        let mut file_map = FileMap::new();
        for relative in files {
            let path = self.snapshots.file_path(version, relative);
            let digest = hasher::hash_file(&path)?.ok_or_else(|| {
                SnapError::unreadable(&path, io::Error::from(io::ErrorKind::NotFound))
            })?;
            file_map.insert(relative.clone(), digest);
        }
        Ok(file_map)
    }

    /// Compare the working tree against the most recent commit
    ///
    /// Returns `Ok(None)` when there are no commits to compare against. Files that
    /// vanish or become unreadable during the comparison count as deleted.
    #[instrument(skip(self))]
    pub fn status(&self) -> Result<Option<StatusReport>> {
        let manifest = self.manifest.load()?;
        match manifest.last() {
            Some(last) => self.compare_with(last).map(Some),
            None => {
                debug!("No commits; nothing to compare");
                Ok(None)
            }
        }
    }

    fn compare_with(&self, record: &CommitRecord) -> Result<StatusReport> {
        let current = self.scan_working_tree()?;
        let mut report = StatusReport {
            base_version: record.label().to_string(),
            ..Default::default()
        };

        for path in &current {
            match record.file_map.get(path) {
                None => report.added.push(path.clone()),
                Some(recorded) => match hasher::hash_file_or_absent(&self.config.root.join(path)) {
                    None => report.deleted.push(path.clone()),
                    Some(digest) if &digest != recorded => report.modified.push(path.clone()),
                    Some(_) => {}
                },
            }
        }

        report.deleted.extend(
            record
                .file_map
                .keys()
                .filter(|path| current.binary_search(path).is_err())
                .cloned(),
        );
        report.deleted.sort();

        debug!(
            "Status vs {}: {} modified, {} new, {} deleted",
            report.base_version,
            report.modified.len(),
            report.added.len(),
            report.deleted.len()
        );
        Ok(report)
    }

    /// Replace the working tree with the contents of snapshot `version`
    ///
    /// Unless `force` is set, the working tree must match the most recent commit.
    /// Every top-level entry except the metadata directory is then removed
    /// and the snapshot's files are copied back. The manifest is left untouched.
    ///
    /// # Errors
    ///
    /// - [`SnapError::VersionNotFound`] if no record carries `version`
    /// - [`SnapError::DirtyWorkingTree`] if uncommitted changes exist and `force` is false
    /// - [`SnapError::SnapshotMissing`] if the record exists but its subtree does not
    ///
    /// All three are raised before anything in the working tree is touched.
    #[instrument(skip(self))]
    pub fn restore(&self, version: &str, force: bool) -> Result<RestoreResult> {
        let start = Instant::now();
        let manifest = self.manifest.load()?;

        if manifest.find_by_version(version).is_none() {
            return Err(SnapError::VersionNotFound(version.to_string()));
        }

        if !force {
            if let Some(last) = manifest.last() {
                let report = self.compare_with(last)?;
                if !report.is_clean() {
                    return Err(SnapError::DirtyWorkingTree {
                        modified: report.modified.len(),
                        added: report.added.len(),
                        deleted: report.deleted.len(),
                    });
                }
            }
        }

        let snapshot_files = self.snapshots.list_files(version)?;
        let entries_removed = self.clear_working_tree()?;

        let mut bytes_written = 0;
        for relative in &snapshot_files {
            bytes_written += utils::copy_preserving_mtime(
                &self.snapshots.file_path(version, relative),
                &self.config.root.join(relative),
            )?;
        }

        let result = RestoreResult {
            version: version.to_string(),
            files_restored: snapshot_files.len(),
            entries_removed,
            bytes_written,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Restored {} in {}ms ({} files restored, {} entries removed)",
            version, result.duration_ms, result.files_restored, result.entries_removed
        );
        Ok(result)
    }

    /// Remove every top-level entry except the metadata directory
    fn clear_working_tree(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.config.root)? {
            let entry = entry?;
            if entry.file_name() == self.config.meta_dir_name.as_str() {
                continue;
            }
            utils::remove_entry(&entry.path())?;
            removed += 1;
        }
        debug!("Removed {} top-level entries", removed);
        Ok(removed)
    }

    /// Line diffs between snapshot `version` and the working tree
    ///
    /// Defaults to the most recent commit. Paths are visited in sorted order over
    /// the union of both sides; identical files are skipped.
    ///
    /// # Errors
    ///
    /// - [`SnapError::NoCommits`] if `version` is `None` and nothing was committed
    /// - [`SnapError::VersionNotFound`] if there is no snapshot subtree for the version
    #[instrument(skip(self, options))]
    pub fn diff(&self, version: Option<&str>, options: &DiffOptions) -> Result<DiffReport> {
        let version = match version {
            Some(tag) => tag.to_string(),
            None => self
                .manifest
                .load()?
                .last()
                .map(|r| r.label().to_string())
                .ok_or(SnapError::NoCommits)?,
        };
        if !self.snapshots.exists(&version) {
            return Err(SnapError::VersionNotFound(version));
        }

        let current: BTreeSet<String> = self.scan_working_tree()?.into_iter().collect();
        let stored: BTreeSet<String> = self.snapshots.list_files(&version)?.into_iter().collect();

        let mut files = Vec::new();
        for path in current.union(&stored) {
            let kind = match (current.contains(path), stored.contains(path)) {
                (true, true) => match self.diff_file(&version, path, options)? {
                    Some(kind) => kind,
                    None => continue,
                },
                (true, false) => DiffKind::Added,
                _ => DiffKind::Deleted,
            };
            files.push(FileDiff {
                path: path.clone(),
                kind,
            });
        }

        debug!("Diff vs {}: {} paths differ", version, files.len());
        Ok(DiffReport { version, files })
    }

    /// `None` when the two copies have identical content
    fn diff_file(&self, version: &str, path: &str, options: &DiffOptions) -> Result<Option<DiffKind>> {
        let current_path = self.config.root.join(path);
        let Some(current_digest) = hasher::hash_file_or_absent(&current_path) else {
            return Ok(Some(DiffKind::Deleted));
        };
        let stored_digest = hasher::hash_file(&self.snapshots.file_path(version, path))?;
        if stored_digest.as_ref() == Some(&current_digest) {
            return Ok(None);
        }

        let Some(mut stored_file) = self.snapshots.open(version, path)? else {
            return Ok(Some(DiffKind::Added));
        };
        let mut stored = Vec::new();
        stored_file.read_to_end(&mut stored)?;

        let current = match fs::read(&current_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Treating {:?} as absent: {}", current_path, e);
                return Ok(Some(DiffKind::Deleted));
            }
        };

        Ok(Some(diff::diff_contents(&stored, &current, options)))
    }

    /// Commit history, most recent first
    #[instrument(skip(self))]
    pub fn log(&self) -> Result<History> {
        let manifest = self.manifest.load()?;
        debug!("Loaded {} commit records", manifest.records.len());
        Ok(History {
            entries: manifest.records.iter().rev().map(LogEntry::from).collect(),
            warning: manifest.warning,
        })
    }
}

/// First of `base`, `base-2`, `base-3`, ... not `taken`
fn unique_token(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
