//! # snapvc - Local snapshot versioning for directory trees
//!
//! Records point-in-time full copies of a directory, reports what changed since
//! the last copy, restores any recorded copy and shows line diffs against it.
//!
//! ## Overview
//!
//! There is no object store, no deltas and no branches. Every commit copies
//! every tracked file into `.snapvc/snapshots/<version>/` and appends one record
//! to `.snapvc/manifest.json`. Change detection compares SHA-256 digests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapvc::{DiffOptions, Repository};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::init("./my_project")?;
//!
//! let record = repo.commit("Initial state", Some("v1"))?;
//! println!("Committed {} files as {}", record.file_count(), record.label());
//!
//! // Make some changes to your files...
//!
//! if let Some(status) = repo.status()? {
//!     for path in &status.modified {
//!         println!("M {}", path);
//!     }
//! }
//!
//! let report = repo.diff(None, &DiffOptions::default())?;
//! println!("{} files differ from {}", report.files.len(), report.version);
//!
//! // Refuses to run over uncommitted changes unless forced
//! repo.restore("v1", false)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety Rules
//!
//! - Version tags are unique for the lifetime of the manifest
//! - The manifest is written only after a snapshot copy fully succeeds
//! - Restore checks the target exists, and the tree is clean unless forced,
//!   before deleting anything
//! - A corrupted manifest is reported as [`ManifestWarning`] and read as empty
//!
//! ## Module Organization
//!
//! - [`repository`]: the commit, status, restore, diff and log engines
//! - [`manifest`]: the ordered commit record document
//! - [`snapshot`]: full-copy snapshot subtrees
//! - [`diff`]: line diffs and unified rendering
//! - [`config`]: repository paths and builder
//! - [`types`]: shared data types
//! - [`error`]: error types

pub mod config;
pub mod diff;
pub mod error;
pub mod manifest;
pub mod repository;
pub mod snapshot;
pub mod types;

// Internal modules (not part of public API)
mod hasher;
mod ignore_policy;
mod scanner;
mod utils;

pub use config::{RepoConfig, RepositoryBuilder};
pub use error::{Result, SnapError};
pub use ignore_policy::{IgnorePolicy, BUILTIN_IGNORES};
pub use manifest::{LoadedManifest, ManifestStore, ManifestWarning};
pub use repository::Repository;
pub use snapshot::SnapshotStore;
pub use types::*;
pub use utils::format_bytes;
