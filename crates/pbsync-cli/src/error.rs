//! Error types for pbsync-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A workspace failed to sync
    #[error("failed to sync protos for workspace {root}: {source}")]
    Workspace {
        root: PathBuf,
        #[source]
        source: pbsync_core::Error,
    },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Whether a workspace root failed because it is not usable as one.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Workspace { source, .. } if source.is_configuration())
    }

    /// Wrap a core error with the workspace it happened in.
    pub fn workspace(root: impl Into<PathBuf>, source: pbsync_core::Error) -> Self {
        Self::Workspace {
            root: root.into(),
            source,
        }
    }
}
