//! Error types for pbsync-git

use std::path::PathBuf;

/// Result type for pbsync-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while listing workspace files
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] pbsync_fs::Error),

    #[error("Repository at {path} has no working directory")]
    BareRepository { path: PathBuf },
}
