//! Git repository fixtures.
//!
//! File discovery only reads the index and the working tree status, so
//! none of these create commits.

use std::path::Path;

/// Initialise a real git repository at `path` using `git2`.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Add `relative` (a path inside the working tree) to the index.
///
/// # Panics
/// Panics if the repository cannot be opened or the path cannot be staged.
pub fn stage(repo_root: &Path, relative: &str) {
    let repo = git2::Repository::open(repo_root)
        .unwrap_or_else(|e| panic!("stage: failed to open {}: {e}", repo_root.display()));
    let mut index = repo.index().unwrap();
    index
        .add_path(Path::new(relative))
        .unwrap_or_else(|e| panic!("stage: failed to add {relative}: {e}"));
    index.write().unwrap();
}

/// Stage every non-ignored file in the working tree.
///
/// # Panics
/// Panics if the repository cannot be opened or the index cannot be written.
pub fn stage_all(repo_root: &Path) {
    let repo = git2::Repository::open(repo_root)
        .unwrap_or_else(|e| panic!("stage_all: failed to open {}: {e}", repo_root.display()));
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .unwrap_or_else(|e| panic!("stage_all: failed to add files: {e}"));
    index.write().unwrap();
}
