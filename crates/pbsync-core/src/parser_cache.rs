//! Per-run cache of indexed BUILD files
//!
//! Many protos share a BUILD file, and workers look them up concurrently.
//! Each path is parsed at most once: the first caller runs the parse inside
//! a per-key [`OnceLock`], later callers for the same key wait on that cell,
//! and callers for other keys proceed without blocking. Failures are cached
//! too, so every caller sees the same error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::ParseResult;
use crate::rule_file::RuleFile;

type Cell = Arc<OnceLock<ParseResult<Arc<RuleFile>>>>;
type ParseFn = dyn Fn(&Path) -> ParseResult<RuleFile> + Send + Sync;

/// Memoizing, thread-safe [`RuleFile`] loader.
pub struct RuleFileCache {
    cells: RwLock<HashMap<PathBuf, Cell>>,
    parser: Box<ParseFn>,
    parses: AtomicUsize,
}

impl RuleFileCache {
    /// A cache that reads BUILD files from disk.
    pub fn new() -> Self {
        Self::with_parser(RuleFile::parse)
    }

    /// A cache backed by a custom parse function.
    pub fn with_parser<F>(parser: F) -> Self
    where
        F: Fn(&Path) -> ParseResult<RuleFile> + Send + Sync + 'static,
    {
        Self {
            cells: RwLock::new(HashMap::new()),
            parser: Box::new(parser),
            parses: AtomicUsize::new(0),
        }
    }

    /// The index for `path`, parsing it on first use.
    pub fn get(&self, path: &Path) -> ParseResult<Arc<RuleFile>> {
        let cell = self.cell(path);
        cell.get_or_init(|| {
            self.parses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(path = %path.display(), "Parsing BUILD file");
            (self.parser)(path).map(Arc::new)
        })
        .clone()
    }

    /// How many times the underlying parser has run.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }

    /// Number of distinct paths requested so far.
    pub fn len(&self) -> usize {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, path: &Path) -> Cell {
        if let Some(cell) = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Arc::clone(cell);
        }

        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(path.to_path_buf()).or_default())
    }
}

impl Default for RuleFileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleFileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleFileCache")
            .field("entries", &self.len())
            .field("parses", &self.parse_count())
            .finish_non_exhaustive()
    }
}
