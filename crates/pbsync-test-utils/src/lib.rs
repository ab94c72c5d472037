//! Shared test utilities for the pbsync workspace.
//!
//! Test-only crate, never published.
//!
//! # Modules
//!
//! - [`git`]: git repository fixtures
//! - [`workspace`]: [`TestWorkspace`] builder for fake Bazel workspaces with a
//!   fake `bazel-bin` output tree

pub mod git;
pub mod workspace;

pub use workspace::TestWorkspace;
