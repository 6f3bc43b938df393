//! Content hashing for change detection
//!
//! Digests are SHA-256 over the file bytes, read in fixed-size chunks so memory
//! use does not grow with file size. They only answer "same content or not".

use crate::error::{Result, SnapError};
use crate::types::ContentDigest;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::warn;

const CHUNK_SIZE: usize = 8192;

/// Hash the content of the file at `path`
///
/// Returns `Ok(None)` when the file does not exist. Any other I/O failure is a
/// [`SnapError::FileUnreadable`].
///
/// # Example
///
/// ```rust,ignore
/// let digest = hash_file(Path::new("notes.txt"))?.expect("file exists");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
pub fn hash_file(path: &Path) -> Result<Option<ContentDigest>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SnapError::unreadable(path, e)),
    };
    hash_reader(file)
        .map(Some)
        .map_err(|e| SnapError::unreadable(path, e))
}

/// Like [`hash_file`], but an unreadable file also counts as absent
///
/// Used by comparisons, where a file that vanished or cannot be read is reported
/// as a deletion instead of aborting the whole report.
pub fn hash_file_or_absent(path: &Path) -> Option<ContentDigest> {
    match hash_file(path) {
        Ok(digest) => digest,
        Err(e) => {
            warn!("Treating {:?} as absent: {}", path, e);
            None
        }
    }
}

/// Hash everything readable from `reader`
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentDigest::from_hex(hex::encode(hasher.finalize())))
}

/// Hash bytes already in memory
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest::from_hex(hex::encode(Sha256::digest(data)))
}
