//! Git-backed file discovery for pbsync
//!
//! Lists the files a workspace actually contains: everything in the git
//! index plus untracked files that are not ignored. Build outputs and
//! vendored trees that `.gitignore` excludes are never visited.

pub mod error;
pub mod list;

pub use error::{Error, Result};
pub use list::list_files;
