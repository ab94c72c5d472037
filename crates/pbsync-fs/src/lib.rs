//! Filesystem helpers for pbsync
//!
//! Provides workspace markers, atomic writes, optional reads, content
//! digests, and the persisted key/value cache used across runs.

pub mod cache;
pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use cache::DiskCache;
pub use constants::{BAZEL_BIN_LINK, BUILD_FILE_NAME, WorkspaceMarker};
pub use error::{Error, Result};
pub use path::{canonicalize, file_name_str, has_extension, workspace_relative};
