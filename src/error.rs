//! Error types for snapvc
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! [`SnapError`]. Precondition failures (missing repository, unknown or reused
//! version tag, dirty working tree) are reported before any side effect happens.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the snapvc library
pub type Result<T> = std::result::Result<T, SnapError>;

/// Main error type for all snapvc operations
#[derive(Debug, Error)]
pub enum SnapError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal failed (unreadable subtree, broken entry)
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// A repository already exists at the given root
    #[error("Repository already exists at {0:?}")]
    RepositoryAlreadyExists(PathBuf),

    /// No repository metadata directory was found
    #[error("No repository found at {0:?}")]
    RepositoryNotFound(PathBuf),

    /// Commit requested with a version tag that is already recorded
    #[error("Version '{0}' already exists")]
    DuplicateVersion(String),

    /// No commit record or snapshot matches the requested tag
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// The manifest names a version but its snapshot subtree is gone
    #[error("Snapshot for version '{0}' is missing from storage")]
    SnapshotMissing(String),

    /// Version tags become directory names and must be a single path segment
    #[error("Invalid version tag: {0:?}")]
    InvalidVersionTag(String),

    /// The operation needs at least one commit
    #[error("No commits yet")]
    NoCommits,

    /// Restore refused because the working tree differs from the last commit
    #[error("Uncommitted changes: {modified} modified, {added} new, {deleted} deleted")]
    DirtyWorkingTree {
        /// Number of modified files
        modified: usize,
        /// Number of untracked files
        added: usize,
        /// Number of deleted files
        deleted: usize,
    },

    /// A tracked file could not be read while hashing or copying it
    #[error("Cannot read {path:?}: {source}")]
    FileUnreadable {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file name is not valid UTF-8 and cannot be stored in the manifest
    #[error("Path conversion error: {0:?}")]
    PathConversion(std::ffi::OsString),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SnapError {
    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        SnapError::Internal(msg.into())
    }

    /// Wrap an I/O error raised while reading `path`
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapError::FileUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Check if this error aborted the operation before any mutation
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SnapError::RepositoryAlreadyExists(_)
                | SnapError::RepositoryNotFound(_)
                | SnapError::DuplicateVersion(_)
                | SnapError::VersionNotFound(_)
                | SnapError::SnapshotMissing(_)
                | SnapError::InvalidVersionTag(_)
                | SnapError::NoCommits
                | SnapError::DirtyWorkingTree { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            SnapError::RepositoryNotFound(path) => {
                format!("No repository found at {:?}. Run 'snapvc init' first.", path)
            }
            SnapError::DuplicateVersion(tag) => {
                format!("Version '{}' already exists. Pick a new tag.", tag)
            }
            SnapError::VersionNotFound(tag) => {
                format!("Version '{}' not found. Use 'snapvc log' to see recorded versions.", tag)
            }
            SnapError::DirtyWorkingTree { .. } => {
                format!("{}. Commit them first or use '--force' to overwrite.", self)
            }
            SnapError::NoCommits => {
                "No commits yet. Create one with 'snapvc commit -m <message>'.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
