//! Manifest store
//!
//! The manifest is one JSON document holding the ordered array of
//! [`CommitRecord`]s, oldest first. It is only ever rewritten as a whole: load,
//! push one record, save. The write goes through a temp file and a rename, so a
//! crash loses at most the commit in flight.
//!
//! A document that exists but does not parse is not an error. [`ManifestStore::load`]
//! returns an empty history together with a [`ManifestWarning`] so callers can tell
//! "no commits yet" apart from "history was unreadable".

use crate::error::Result;
use crate::types::CommitRecord;
use crate::utils;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why a loaded manifest should not be trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestWarning {
    /// The document could not be parsed; history was treated as empty
    Corrupted {
        /// Manifest path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

impl std::fmt::Display for ManifestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestWarning::Corrupted { path, reason } => write!(
                f,
                "manifest {:?} is corrupted ({}); history treated as empty",
                path, reason
            ),
        }
    }
}

/// Records read from disk plus any degradation that happened while reading
#[derive(Debug, Clone, Default)]
pub struct LoadedManifest {
    /// Commit records, oldest first
    pub records: Vec<CommitRecord>,
    /// Set when the document was unreadable
    pub warning: Option<ManifestWarning>,
}

impl LoadedManifest {
    /// Most recent commit
    pub fn last(&self) -> Option<&CommitRecord> {
        self.records.last()
    }

    /// First record whose `version` equals `tag`; legacy records never match
    pub fn find_by_version(&self, tag: &str) -> Option<&CommitRecord> {
        self.records
            .iter()
            .find(|record| record.version.as_deref() == Some(tag))
    }

    /// Whether any record already uses `tag` as its version
    pub fn contains_version(&self, tag: &str) -> bool {
        self.find_by_version(tag).is_some()
    }
}

/// Reads and writes the manifest document
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    /// Store backed by the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manifest document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records
    ///
    /// A missing document yields an empty history. A corrupted one yields an
    /// empty history and a warning; I/O failures other than "not found" are errors.
    pub fn load(&self) -> Result<LoadedManifest> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No manifest at {:?}", self.path);
                return Ok(LoadedManifest::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Vec<CommitRecord>>(&content) {
            Ok(records) => {
                debug!("Loaded {} commit records", records.len());
                Ok(LoadedManifest {
                    records,
                    warning: None,
                })
            }
            Err(e) => {
                let warning = ManifestWarning::Corrupted {
                    path: self.path.clone(),
                    reason: e.to_string(),
                };
                warn!("{}", warning);
                Ok(LoadedManifest {
                    records: Vec::new(),
                    warning: Some(warning),
                })
            }
        }
    }

    /// Overwrite the document with `records`
    pub fn save(&self, records: &[CommitRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)?;
        utils::atomic_write(&self.path, &json)?;
        debug!("Saved {} commit records to {:?}", records.len(), self.path);
        Ok(())
    }

    /// Load, then look up `tag`
    pub fn find_by_version(&self, tag: &str) -> Result<Option<CommitRecord>> {
        Ok(self.load()?.find_by_version(tag).cloned())
    }
}
