//! Content fingerprints
//!
//! A fingerprint is the lowercase hex SHA-256 digest of a file's bytes,
//! computed by streaming fixed-size chunks so memory use does not depend on
//! file size. Metadata (timestamps, permissions) never affects the result.
//!
//! ```rust
//! use filetrack::fingerprint::hash_bytes;
//!
//! let digest = hash_bytes(b"hello");
//! assert_eq!(digest.len(), 64);
//! ```

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

/// Read size used when streaming file content into the hasher
pub const CHUNK_SIZE: usize = 4096;

/// Fingerprint a file on disk
///
/// Returns `None` when the file cannot be opened or read. The most common
/// cause is a notification that arrives after the file was already removed
/// or rotated; the engine records that as an unreadable state rather than
/// failing. No path filtering is applied here.
pub fn fingerprint(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            trace!("Cannot open {} for fingerprinting: {}", path.display(), e);
            return None;
        }
    };

    match fingerprint_reader(file) {
        Ok(digest) => Some(digest),
        Err(e) => {
            trace!("Read of {} failed mid-stream: {}", path.display(), e);
            None
        }
    }
}

/// Fingerprint everything readable from `reader`
///
/// The digest depends only on the bytes produced, never on how the reader
/// splits them across calls.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint in-memory data
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
