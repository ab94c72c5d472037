//! Persisted key/value cache
//!
//! Stores small text values (such as the resolved `bazel-bin` directory)
//! across process invocations. Each entry lives in its own file named after
//! the SHA-256 digest of its key.

use std::path::PathBuf;

use crate::checksum::sha256_hex;
use crate::{Error, Result, io};

/// Directory name used under the user cache directory.
const CACHE_DIR_NAME: &str = "pbsync";

/// A directory-backed key/value store for short text values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Create a cache rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache rooted at `<user cache dir>/pbsync`.
    pub fn user_default() -> Result<Self> {
        let base = dirs::cache_dir().ok_or(Error::CacheDirUnavailable)?;
        Ok(Self::new(base.join(CACHE_DIR_NAME)))
    }

    /// File that holds the value for `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(sha256_hex(key))
    }

    /// Look up `key`. A missing or empty entry is a miss.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = io::read_text_optional(&self.entry_path(key))?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        tracing::debug!(path = %path.display(), "writing cache entry");
        io::write_atomic(&path, value.as_bytes())
    }

    /// Remove the entry for `key` if present.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}
