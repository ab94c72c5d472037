//! The sync command
//!
//! Runs one [`SyncEngine`] per workspace root, in order, and reports the
//! combined totals.

use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;
use pbsync_core::{SyncConfig, SyncEngine, SyncOutcome};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Sync every root named on the command line.
///
/// A root that is not a usable workspace is reported and skipped. Any other
/// failure aborts the run unless `--keep-going` is set, in which case it is
/// reported too. Either way the run fails at the end if a root failed.
pub fn run_sync(cli: &Cli) -> Result<SyncOutcome> {
    let roots = cli.roots()?;
    let start = Instant::now();

    let mut total = SyncOutcome::default();
    let mut failed = 0;
    for root in &roots {
        match sync_workspace(cli, root) {
            Ok(outcome) => total += outcome,
            Err(e) if cli.keep_going || e.is_configuration() => {
                eprintln!("{}: {}", "error".red().bold(), e);
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    eprintln!("{}", format_summary(&total, start.elapsed(), cli.dry_run));
    if cli.json {
        println!("{}", serde_json::to_string(&total)?);
    }

    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} of {} workspaces failed to sync",
            roots.len()
        )));
    }
    Ok(total)
}

/// Load the configuration of `root` and sync it.
pub fn sync_workspace(cli: &Cli, root: &Path) -> Result<SyncOutcome> {
    let fail = |source| CliError::workspace(root, source);

    let config = SyncConfig::load(root).map_err(fail)?;
    let options = cli.sync_options(&config)?;
    tracing::debug!(root = %root.display(), ?options, "Syncing workspace");

    let engine = SyncEngine::new(root, options).map_err(fail)?;
    engine.run().map_err(fail)
}

/// The one-line report printed after a run.
pub fn format_summary(outcome: &SyncOutcome, elapsed: Duration, dry_run: bool) -> String {
    let label = if dry_run { "would update" } else { "updated" };
    let mut line = format!(
        "pbsync: {label}: {}, up to date: {}, duration: {elapsed:.2?}",
        outcome.updated, outcome.up_to_date
    );
    if outcome.unresolved > 0 {
        line.push_str(&format!(", unresolved: {}", outcome.unresolved));
    }

    if outcome.changed() {
        format!("🔄 {line}")
    } else {
        line.dimmed().to_string()
    }
}
