//! Path helpers shared by the listing and locating code

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Canonicalize `path`, resolving symlinks.
///
/// Uses `dunce` so Windows results stay in their plain `C:\` form and compare
/// equal to paths reported by git and Bazel.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}

/// Strip `root` from `path`, returning the workspace-relative remainder.
///
/// Returns `None` when `path` does not live under `root`.
pub fn workspace_relative<'a>(root: &Path, path: &'a Path) -> Option<&'a Path> {
    path.strip_prefix(root).ok()
}

/// The final component of `path` as UTF-8, if it has one.
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Whether `path` ends in `.{extension}`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}
