//! Error types for pbsync-core

use std::path::PathBuf;
use std::sync::Arc;

/// Result type for pbsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for BUILD file indexing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors that abort a sync run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No Bazel workspace marker at the given root
    #[error("{path} is not a Bazel workspace (no WORKSPACE, WORKSPACE.bazel or MODULE.bazel)")]
    NotAWorkspace { path: PathBuf },

    /// `.pbsync.toml` exists but could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(#[source] pbsync_fs::Error),

    /// A BUILD file could not be read or indexed
    #[error("Invalid BUILD file {path}: {source}")]
    BuildFile {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A Go import path that does not start with `github.com/<org>/<repo>/`
    #[error(
        "Could not derive a workspace-relative path for import {import_path:?} of '{rule}'"
    )]
    UnsupportedImportPath { rule: String, import_path: String },

    /// A proto path that does not live under the workspace root
    #[error("Proto {proto} is outside workspace {root}")]
    ProtoOutsideWorkspace { proto: PathBuf, root: PathBuf },

    /// A generated artifact exists but has no content
    #[error("Generated artifact {artifact} for {proto} is empty")]
    EmptyArtifact { artifact: PathBuf, proto: PathBuf },

    /// `bazel info` succeeded but printed no `bazel-bin:` line
    #[error("Missing 'bazel-bin' entry in `{command} info --show_make_env` output")]
    MissingBazelBinEntry { command: String },

    /// The bazel command could not be started
    #[error("Could not run `{command}` in {root}: {source}")]
    CommandSpawn {
        command: String,
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `bazel info` exited unsuccessfully
    #[error("`{command}` failed ({}): {stderr}", exit_code_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Proto enumeration through git failed
    #[error("Failed to list protos under {root}: {source}")]
    ListProtos {
        root: PathBuf,
        #[source]
        source: pbsync_git::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from pbsync-fs
    #[error(transparent)]
    Fs(#[from] pbsync_fs::Error),
}

impl Error {
    /// Whether the workspace itself is unusable: no marker, or a bad
    /// `.pbsync.toml`. Such a root fails on its own without affecting others.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotAWorkspace { .. } | Self::Config(_))
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Errors from indexing a single BUILD file.
///
/// Cloneable so a cached failure can be handed to every caller that asks for
/// the same file.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("{path} does not exist")]
    NotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("{path}:{source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: pbsync_build::Error,
    },

    #[error("{path}: proto_library '{rule}' has no srcs list")]
    MissingSrcs { path: PathBuf, rule: String },

    #[error("{path}: proto source '{file}' is claimed by both '{first}' and '{second}'")]
    DuplicateSource {
        path: PathBuf,
        file: String,
        first: String,
        second: String,
    },

    #[error("{path}: '{rule}' has no proto attribute")]
    MissingProtoAttr { path: PathBuf, rule: String },

    #[error("{path}: go_proto_library '{rule}' has no importpath attribute")]
    MissingImportPath { path: PathBuf, rule: String },
}

impl ParseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io {
                path,
                source: Arc::new(source),
            }
        }
    }

    /// Whether the BUILD file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
