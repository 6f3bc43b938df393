//! Names excluded from tracking
//!
//! The policy matches single path segments (a directory or file name), never full
//! paths. The scanner applies it while walking, so an ignored directory is never
//! descended into and an ignored file is never listed.

use std::collections::BTreeSet;

/// Caches, editor state, VCS and OS metadata that are never tracked
pub const BUILTIN_IGNORES: &[&str] = &[
    "__pycache__",
    ".git",
    ".DS_Store",
    "Thumbs.db",
    "venv",
    ".idea",
    ".vscode",
];

/// Pure predicate over path segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePolicy {
    names: BTreeSet<String>,
}

impl IgnorePolicy {
    /// Built-in set plus the metadata directory name
    pub fn new(meta_dir_name: &str) -> Self {
        let mut names: BTreeSet<String> = BUILTIN_IGNORES.iter().map(|s| s.to_string()).collect();
        names.insert(meta_dir_name.to_string());
        Self { names }
    }

    /// Add more excluded names
    pub fn with_names(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.names.extend(extra);
        self
    }

    /// Whether `segment` is excluded
    pub fn is_ignored(&self, segment: &str) -> bool {
        self.names.contains(segment)
    }
}
