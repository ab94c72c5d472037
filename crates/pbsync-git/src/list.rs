//! Listing workspace files through the git index and status

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository, Status, StatusOptions};

use crate::{Error, Result};

/// List files under `root` whose extension is `extension`.
///
/// The result holds tracked files and untracked files that are not ignored,
/// as absolute, deduplicated, sorted paths. A `root` that is not inside a
/// git repository yields an empty list.
pub fn list_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let root = pbsync_fs::canonicalize(root)?;

    let repo = match Repository::discover(&root) {
        Ok(repo) => repo,
        Err(e) if e.code() == ErrorCode::NotFound => {
            tracing::debug!(root = %root.display(), "No git repository found, nothing to list");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let workdir = repo.workdir().ok_or_else(|| Error::BareRepository {
        path: repo.path().to_path_buf(),
    })?;
    let workdir = pbsync_fs::canonicalize(workdir)?;

    let mut files = BTreeSet::new();
    let mut keep = |relative: &str| {
        let path = workdir.join(relative);
        if pbsync_fs::has_extension(&path, extension) && path.starts_with(&root) {
            files.insert(path);
        }
    };

    let index = repo.index()?;
    for entry in index.iter() {
        match std::str::from_utf8(&entry.path) {
            Ok(relative) => keep(relative),
            Err(_) => tracing::debug!(
                path = %String::from_utf8_lossy(&entry.path),
                "Skipping non UTF-8 index entry"
            ),
        }
    }

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut opts))?;
    for entry in statuses.iter() {
        if !entry.status().contains(Status::WT_NEW) {
            continue;
        }
        if let Some(relative) = entry.path() {
            keep(relative);
        }
    }

    tracing::debug!(
        root = %root.display(),
        extension,
        count = files.len(),
        "Listed workspace files"
    );

    Ok(files.into_iter().collect())
}
