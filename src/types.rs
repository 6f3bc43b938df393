//! Core data types used throughout snapvc
//!
//! ## Overview
//!
//! - **Persisted state**: [`CommitRecord`], [`FileMap`], [`ContentDigest`] make up the
//!   manifest document written to `.snapvc/manifest.json`
//! - **Operation results**: [`StatusReport`], [`RestoreResult`], [`DiffReport`], [`History`]
//! - **Options**: [`DiffOptions`]
//!
//! Field names of [`CommitRecord`] are part of the on-disk format and must stay stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hex-encoded SHA-256 digest of a file's content
///
/// Only used to tell whether two files have the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Wrap an already hex-encoded digest
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tracked relative path (always `/`-separated) to content digest at commit time
pub type FileMap = BTreeMap<String, ContentDigest>;

/// One snapshot event in the manifest
///
/// Records written by older tools may lack `version`; they are still listed
/// (labelled by `id`) but can never be looked up by tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Unique version tag, also the snapshot subtree name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Creation timestamp token (`%Y%m%d%H%M%S`, suffixed when needed to stay distinct)
    pub id: String,
    /// Human-readable creation time
    pub timestamp: String,
    /// Free-text description
    pub message: String,
    /// Digest of every tracked file at commit time
    #[serde(default)]
    pub file_map: FileMap,
}

impl CommitRecord {
    /// Display label: the version tag, or the id for legacy records
    pub fn label(&self) -> &str {
        self.version.as_deref().unwrap_or(&self.id)
    }

    /// Number of files captured by this commit
    pub fn file_count(&self) -> usize {
        self.file_map.len()
    }
}

/// Working tree compared against the most recent commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Label of the commit the tree was compared against
    pub base_version: String,
    /// Present in both, content differs
    pub modified: Vec<String>,
    /// Present now, absent from the commit
    pub added: Vec<String>,
    /// Recorded in the commit, absent now
    pub deleted: Vec<String>,
}

impl StatusReport {
    /// True when the working tree matches the commit exactly
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.deleted.is_empty()
    }

    /// Total number of differing paths
    pub fn total_changes(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len()
    }
}

/// Result of a restore operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    /// Version that was restored
    pub version: String,
    /// Number of files copied back from the snapshot
    pub files_restored: usize,
    /// Number of top-level working tree entries removed before copying
    pub entries_removed: usize,
    /// Total bytes written
    pub bytes_written: u64,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Options controlling line diff generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Unchanged lines shown around each change
    pub context_lines: usize,
    /// Files larger than this (in bytes) are reported without a line diff (0 = unlimited)
    pub max_file_size: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: 3,
            max_file_size: 16 * 1024 * 1024,
        }
    }
}

/// A single line in a diff hunk; content keeps its line terminator if it had one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineChange {
    /// Unchanged line
    Context(String),
    /// Line only in the snapshot
    Deleted(String),
    /// Line only in the working tree
    Added(String),
}

/// A contiguous block of changes with surrounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// 1-based first line in the snapshot file (0 when the range is empty)
    pub from_line: usize,
    /// Number of snapshot lines covered
    pub from_count: usize,
    /// 1-based first line in the working tree file (0 when the range is empty)
    pub to_line: usize,
    /// Number of working tree lines covered
    pub to_count: usize,
    /// Lines in order
    pub changes: Vec<LineChange>,
}

/// How one path differs between a snapshot and the working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    /// Text file with differing content
    Modified {
        /// Line hunks
        hunks: Vec<DiffHunk>,
        /// Lines only in the working tree
        lines_added: usize,
        /// Lines only in the snapshot
        lines_deleted: usize,
    },
    /// Content differs but at least one side is not valid UTF-8
    Binary,
    /// Content differs but a side exceeds [`DiffOptions::max_file_size`]
    TooLarge,
    /// Only in the working tree
    Added,
    /// Only in the snapshot
    Deleted,
}

/// Difference for a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Relative path
    pub path: String,
    /// What changed
    pub kind: DiffKind,
}

/// Working tree compared against one snapshot, in path order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Version the working tree was compared against
    pub version: String,
    /// Differing paths only; identical files are omitted
    pub files: Vec<FileDiff>,
}

impl DiffReport {
    /// True when nothing differs
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of added and deleted lines across all text diffs
    pub fn line_totals(&self) -> (usize, usize) {
        self.files.iter().fold((0, 0), |(a, d), f| match &f.kind {
            DiffKind::Modified {
                lines_added,
                lines_deleted,
                ..
            } => (a + lines_added, d + lines_deleted),
            _ => (a, d),
        })
    }
}

/// One line of history as shown by `log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Version tag, or id for legacy records
    pub label: String,
    /// Human-readable creation time
    pub timestamp: String,
    /// Commit message
    pub message: String,
    /// Number of files in the snapshot
    pub file_count: usize,
}

impl From<&CommitRecord> for LogEntry {
    fn from(record: &CommitRecord) -> Self {
        Self {
            label: record.label().to_string(),
            timestamp: record.timestamp.clone(),
            message: record.message.clone(),
            file_count: record.file_count(),
        }
    }
}

/// Commit history, newest first
#[derive(Debug, Clone)]
pub struct History {
    /// Entries, most recent commit first
    pub entries: Vec<LogEntry>,
    /// Set when the manifest was unreadable and history was defaulted to empty
    pub warning: Option<crate::manifest::ManifestWarning>,
}
