//! SHA-256 digest utilities
//!
//! Cache keys and cache file names are derived from hex SHA-256 digests so
//! that arbitrary inputs (absolute paths, command names) map to stable,
//! filesystem-safe names.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `content`.
pub fn sha256_hex(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    format!("{:x}", hasher.finalize())
}

/// Build a composite cache key from several parts.
///
/// Each part is digested on its own and the digests are concatenated, so
/// `["ab", "c"]` and `["a", "bc"]` never collide.
pub fn cache_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    parts.into_iter().map(sha256_hex).collect()
}
