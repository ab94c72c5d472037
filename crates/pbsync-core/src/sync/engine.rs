//! SyncEngine implementation
//!
//! The engine lists every proto in the workspace and, for each one, copies
//! the artifacts its generators produced from `bazel-bin` into the source
//! tree. Destinations that already match byte-for-byte are left alone, so
//! running twice in a row writes nothing the second time.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use pbsync_fs::{BUILD_FILE_NAME, DiskCache, WorkspaceMarker, io};

use super::outcome::{Counters, SyncOutcome};
use crate::bazel::BazelBinResolver;
use crate::config::SyncConfig;
use crate::generator::{LocateContext, SyncPair};
use crate::parser_cache::RuleFileCache;
use crate::{Error, Result};

const PROTO_EXTENSION: &str = "proto";

/// Options for a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Worker threads. `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// If true, count what would change without writing anything.
    pub dry_run: bool,
    /// Command used for `bazel info`.
    pub bazel_command: String,
    /// Fixed output directory, bypassing discovery.
    pub bazel_bin: Option<PathBuf>,
    /// Persist the resolved output directory in the user cache.
    pub disk_cache: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            jobs: config.jobs,
            dry_run: false,
            bazel_command: config.bazel_command.clone(),
            bazel_bin: config.bazel_bin.clone(),
            disk_cache: config.disk_cache,
        }
    }
}

impl SyncOptions {
    /// Effective worker count, at least one.
    pub fn effective_jobs(&self) -> usize {
        self.jobs
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get))
            .max(1)
    }
}

/// Engine for synchronizing generated artifacts of one workspace.
///
/// Parsed BUILD files and the resolved output directory are cached for the
/// life of the engine, so build a new engine for each run.
#[derive(Debug)]
pub struct SyncEngine {
    root: PathBuf,
    options: SyncOptions,
    rule_files: RuleFileCache,
    resolver: BazelBinResolver,
}

impl SyncEngine {
    /// Create an engine for the Bazel workspace at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAWorkspace`] if `root` does not exist or has no
    /// workspace marker file.
    pub fn new(root: impl AsRef<Path>, options: SyncOptions) -> Result<Self> {
        let root = match pbsync_fs::canonicalize(root.as_ref()) {
            Ok(root) => root,
            Err(e) if e.is_not_found() => {
                return Err(Error::NotAWorkspace {
                    path: root.as_ref().to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        if WorkspaceMarker::detect(&root).is_none() {
            return Err(Error::NotAWorkspace { path: root });
        }

        let disk_cache = if options.disk_cache {
            match DiskCache::user_default() {
                Ok(cache) => Some(cache),
                Err(e) => {
                    tracing::warn!(error = %e, "Disk cache disabled");
                    None
                }
            }
        } else {
            None
        };

        let resolver = BazelBinResolver::new()
            .with_command(options.bazel_command.clone())
            .with_override(options.bazel_bin.clone())
            .with_disk_cache(disk_cache);

        Ok(Self {
            root,
            options,
            rule_files: RuleFileCache::new(),
            resolver,
        })
    }

    /// Replace the output directory resolver.
    pub fn with_resolver(mut self, resolver: BazelBinResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The canonical workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// BUILD files parsed so far.
    pub fn rule_files(&self) -> &RuleFileCache {
        &self.rule_files
    }

    /// Sync every proto in the workspace.
    ///
    /// Protos are processed concurrently. The first error stops workers from
    /// picking up new protos and is returned once all of them have finished;
    /// files already written stay written.
    pub fn run(&self) -> Result<SyncOutcome> {
        let protos = pbsync_git::list_files(&self.root, PROTO_EXTENSION).map_err(|source| {
            Error::ListProtos {
                root: self.root.clone(),
                source,
            }
        })?;

        let jobs = self.options.effective_jobs().min(protos.len()).max(1);
        tracing::info!(
            root = %self.root.display(),
            protos = protos.len(),
            jobs,
            dry_run = self.options.dry_run,
            "Syncing protos"
        );

        let counters = Counters::default();
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let first_error: Mutex<Option<Error>> = Mutex::new(None);

        if !protos.is_empty() {
            thread::scope(|scope| {
                for _ in 0..jobs {
                    scope.spawn(|| {
                        while !stop.load(Ordering::Acquire) {
                            let Some(proto) = protos.get(next.fetch_add(1, Ordering::Relaxed))
                            else {
                                break;
                            };
                            if let Err(e) = self.sync_proto(proto, &counters) {
                                let mut slot =
                                    first_error.lock().unwrap_or_else(PoisonError::into_inner);
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                stop.store(true, Ordering::Release);
                            }
                        }
                    });
                }
            });
        }

        if let Some(e) = first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(e);
        }

        let outcome = counters.snapshot();
        tracing::debug!(?outcome, "Sync finished");
        Ok(outcome)
    }

    fn sync_proto(&self, proto: &Path, counters: &Counters) -> Result<()> {
        let dir = proto.parent().unwrap_or(&self.root);
        let build_path = dir.join(BUILD_FILE_NAME);

        let rule_file = match self.rule_files.get(&build_path) {
            Ok(rule_file) => rule_file,
            Err(e) if e.is_not_found() => {
                tracing::debug!(proto = %proto.display(), "No BUILD file next to proto");
                return Ok(());
            }
            Err(source) => {
                return Err(Error::BuildFile {
                    path: build_path,
                    source,
                });
            }
        };

        let generators = rule_file.generators_for(proto);
        if generators.is_empty() {
            tracing::warn!(
                proto = %proto.display(),
                build_file = %build_path.display(),
                "Could not figure out generation rules for proto"
            );
            counters.unresolved();
            return Ok(());
        }

        let bazel_bin = self.resolver.resolve(&self.root)?;
        let ctx = LocateContext {
            workspace_root: &self.root,
            bazel_bin: &bazel_bin,
            proto,
        };

        for generator in generators {
            for pair in generator.locate(&ctx)? {
                self.sync_pair(proto, &pair, counters)?;
            }
        }
        Ok(())
    }

    fn sync_pair(&self, proto: &Path, pair: &SyncPair, counters: &Counters) -> Result<()> {
        let Some(content) = io::read_optional(&pair.src)? else {
            tracing::debug!(artifact = %pair.src.display(), "Artifact not built, skipping");
            return Ok(());
        };
        if content.is_empty() {
            return Err(Error::EmptyArtifact {
                artifact: pair.src.clone(),
                proto: proto.to_path_buf(),
            });
        }

        if io::read_optional(&pair.dest)?.as_deref() == Some(content.as_slice()) {
            counters.up_to_date();
            return Ok(());
        }

        if self.options.dry_run {
            tracing::info!(dest = %pair.dest.display(), "Would update");
        } else {
            io::write_atomic(&pair.dest, &content)?;
            tracing::info!(dest = %pair.dest.display(), "Updated");
        }
        counters.updated();
        Ok(())
    }
}
