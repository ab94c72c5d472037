//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use pbsync_core::{SyncConfig, SyncOptions};

/// Copy Bazel-generated proto artifacts into the source tree
///
/// For every `.proto` file in each workspace, finds the generated Go
/// (`.pb.go`) and TypeScript (`.d.ts`) files in `bazel-bin` and copies them
/// next to the sources, leaving files that are already up to date alone.
///
/// Examples:
///   pbsync                         # Sync the workspace in the current directory
///   pbsync ~/src/a ~/src/b         # Sync two workspaces in order
///   pbsync --dry-run -v            # Show what would change
#[derive(Parser, Debug)]
#[command(name = "pbsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of worker threads (defaults to the available parallelism)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the totals as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Use this output directory instead of discovering it
    #[arg(long, value_name = "PATH", env = "PBSYNC_BAZEL_BIN")]
    pub bazel_bin: Option<PathBuf>,

    /// Do not read or write the persisted bazel-bin cache
    #[arg(long)]
    pub no_cache: bool,

    /// Keep syncing the remaining workspaces after one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Bazel workspace roots (defaults to the current directory)
    #[arg(value_name = "WORKSPACE_ROOT")]
    pub roots: Vec<PathBuf>,
}

impl Cli {
    /// Workspace roots to sync, in order.
    pub fn roots(&self) -> std::io::Result<Vec<PathBuf>> {
        if self.roots.is_empty() {
            Ok(vec![std::env::current_dir()?])
        } else {
            Ok(self.roots.clone())
        }
    }

    /// Merge the workspace configuration with the command line; flags win.
    ///
    /// A relative `--bazel-bin` is taken relative to the current directory,
    /// while one from `.pbsync.toml` stays relative to the workspace root.
    pub fn sync_options(&self, config: &SyncConfig) -> std::io::Result<SyncOptions> {
        let mut options = SyncOptions::from(config);
        options.dry_run = self.dry_run;
        if let Some(jobs) = self.jobs {
            options.jobs = Some(jobs);
        }
        if let Some(bazel_bin) = &self.bazel_bin {
            options.bazel_bin = Some(std::path::absolute(bazel_bin)?);
        }
        if self.no_cache {
            options.disk_cache = false;
        }
        Ok(options)
    }
}
