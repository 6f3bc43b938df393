//! Filesystem helpers shared by the stores and engines

use crate::error::{Result, SnapError};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Write `content` to a sibling temp file, then rename it over `path`
///
/// Readers never observe a half-written document.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Copy a file, creating parent directories and carrying over its mtime
///
/// Returns the number of bytes copied. Read failures on `src` are reported as
/// [`SnapError::FileUnreadable`].
pub fn copy_preserving_mtime(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let metadata = fs::metadata(src).map_err(|e| SnapError::unreadable(src, e))?;
    let bytes = fs::copy(src, dst).map_err(|e| SnapError::unreadable(src, e))?;

    let mtime = FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_mtime(dst, mtime) {
        // Not every filesystem supports it.
        trace!("Could not preserve mtime on {:?}: {}", dst, e);
    }
    Ok(bytes)
}

/// Remove a file, symlink or whole directory tree
pub fn remove_entry(path: &Path) -> Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    trace!("Removed {:?}", path);
    Ok(())
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
