//! MD5 file hasher with streaming support.
//!
//! # Overview
//!
//! The [`Hasher`] reads a file in fixed 4KB chunks and feeds each chunk to an
//! MD5 accumulator, so memory use stays flat regardless of photo or video
//! size. The whole file is always hashed; there is no prefix short-circuit.
//!
//! MD5 is not collision resistant against an adversary. Two different
//! photos landing on the same digest by accident is treated as negligible.
//!
//! # Example
//!
//! ```no_run
//! use gphotos_dedupe::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let fingerprint = hasher.full_hash(Path::new("IMG_0001.jpg")).unwrap();
//! println!("{}", hash_to_hex(&fingerprint));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use md5::{Digest, Md5};

use super::HashError;

/// Read buffer size used while streaming file content.
pub const CHUNK_SIZE: usize = 4096;

/// 128-bit MD5 content digest.
pub type Fingerprint = [u8; 16];

/// Streaming MD5 hasher.
#[derive(Debug, Default, Clone)]
pub struct Hasher {
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop hashing between chunks once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the MD5 fingerprint of the entire file at `path`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file disappeared since it was discovered
    /// - `PermissionDenied` if it cannot be opened for reading
    /// - `Io` for any other read failure
    /// - `Interrupted` if shutdown was requested mid-file
    pub fn full_hash(&self, path: &Path) -> Result<Fingerprint, HashError> {
        self.hash_with_len(path).map(|(fingerprint, _)| fingerprint)
    }

    /// Like [`Hasher::full_hash`], also returning the number of bytes hashed.
    ///
    /// The length is what the digest actually covers, which can differ from
    /// the size seen during the walk if the file changed in between.
    ///
    /// # Errors
    ///
    /// Same as [`Hasher::full_hash`].
    pub fn hash_with_len(&self, path: &Path) -> Result<(Fingerprint, u64), HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut digest = Md5::new();
        let mut len = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            };
            digest.update(&buffer[..read]);
            len += read as u64;
        }

        let fingerprint: Fingerprint = digest.finalize().into();
        log::trace!("{}  {}", hash_to_hex(&fingerprint), path.display());
        Ok((fingerprint, len))
    }
}

fn map_io_error(path: &Path, error: io::Error) -> HashError {
    match error.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Render a fingerprint as 32 lowercase hex characters.
#[must_use]
pub fn hash_to_hex(fingerprint: &Fingerprint) -> String {
    use std::fmt::Write;

    fingerprint
        .iter()
        .fold(String::with_capacity(32), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}
