//! Repository configuration
//!
//! A [`RepoConfig`] is the explicit value every store and engine works from: the
//! tracked root plus the metadata paths derived from it. There is no process-wide
//! repository state; build a config (usually through [`RepositoryBuilder`]) and hand
//! it to the [`Repository`](crate::Repository).
//!
//! ```text
//! <root>/
//! └── .snapvc/
//!     ├── manifest.json
//!     └── snapshots/
//!         └── <version>/...
//! ```

use crate::error::Result;
use crate::ignore_policy::IgnorePolicy;
use crate::repository::Repository;
use std::path::{Path, PathBuf};

/// Default name of the metadata directory under the repository root
pub const DEFAULT_META_DIR: &str = ".snapvc";
/// Manifest document name inside the metadata directory
pub const MANIFEST_FILE: &str = "manifest.json";
/// Snapshot storage directory name inside the metadata directory
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Root path and derived metadata paths for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    /// Absolute root of the working tree
    pub root: PathBuf,
    /// Name of the metadata directory directly under `root`
    pub meta_dir_name: String,
    /// Names excluded from tracking on top of the built-in set
    pub extra_ignores: Vec<String>,
}

impl RepoConfig {
    /// Config with default metadata directory and ignore set
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            meta_dir_name: DEFAULT_META_DIR.to_string(),
            extra_ignores: Vec::new(),
        }
    }

    /// `<root>/<meta>`
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(&self.meta_dir_name)
    }

    /// `<root>/<meta>/manifest.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.meta_dir().join(MANIFEST_FILE)
    }

    /// `<root>/<meta>/snapshots`
    pub fn snapshots_dir(&self) -> PathBuf {
        self.meta_dir().join(SNAPSHOTS_DIR)
    }

    /// Ignore policy for this repository
    pub fn ignore_policy(&self) -> IgnorePolicy {
        IgnorePolicy::new(&self.meta_dir_name).with_names(self.extra_ignores.iter().cloned())
    }
}

/// Builder for creating or opening a [`Repository`] with custom configuration
///
/// # Examples
///
/// ```rust,no_run
/// use snapvc::RepositoryBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = RepositoryBuilder::new()
///     .ignore_names(vec!["node_modules".to_string(), "target".to_string()])
///     .init("./project")?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Values
///
/// - `meta_dir_name`: `.snapvc`
/// - `ignore_names`: empty (the built-in set always applies)
#[derive(Debug, Clone)]
pub struct RepositoryBuilder {
    meta_dir_name: String,
    ignore_names: Vec<String>,
}

impl RepositoryBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            meta_dir_name: DEFAULT_META_DIR.to_string(),
            ignore_names: Vec::new(),
        }
    }

    /// Use a different metadata directory name; it is always ignored
    pub fn meta_dir_name(mut self, name: impl Into<String>) -> Self {
        self.meta_dir_name = name.into();
        self
    }

    /// Additional file or directory names to exclude from tracking
    ///
    /// Names match whole path segments, exactly like the built-in set. The
    /// same names must be passed every time the repository is opened.
    pub fn ignore_names(mut self, names: Vec<String>) -> Self {
        self.ignore_names = names;
        self
    }

    /// Create a new repository at `root`
    ///
    /// # Errors
    ///
    /// - [`SnapError::RepositoryAlreadyExists`](crate::SnapError::RepositoryAlreadyExists)
    ///   if the metadata directory is already there
    pub fn init(self, root: impl AsRef<Path>) -> Result<Repository> {
        Repository::init_with_config(self.into_config(root.as_ref())?)
    }

    /// Open an existing repository at `root`
    ///
    /// # Errors
    ///
    /// - [`SnapError::RepositoryNotFound`](crate::SnapError::RepositoryNotFound)
    ///   if `root` holds no metadata directory
    pub fn open(self, root: impl AsRef<Path>) -> Result<Repository> {
        Repository::open_with_config(self.into_config(root.as_ref())?)
    }

    fn into_config(self, root: &Path) -> Result<RepoConfig> {
        Ok(RepoConfig {
            root: root.canonicalize()?,
            meta_dir_name: self.meta_dir_name,
            extra_ignores: self.ignore_names,
        })
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
