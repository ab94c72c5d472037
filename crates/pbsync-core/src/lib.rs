//! Proto artifact resolution and sync engine for pbsync
//!
//! This crate ties the lower layers together:
//!
//! - **Rule files**: a proto → `proto_library` → generators index per BUILD file
//! - **Generators**: where each generator kind puts its output and where it belongs
//! - **Parser cache**: parse each BUILD file once per run, across threads
//! - **Bazel-bin resolution**: find the output tree without running Bazel when possible
//! - **SyncEngine**: the concurrent, idempotent copy pass
//!
//! # Architecture
//!
//! ```text
//!                    pbsync-cli
//!                        |
//!                   pbsync-core
//!                        |
//!        +---------------+---------------+
//!        |               |               |
//!  pbsync-build      pbsync-git      pbsync-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pbsync_core::{SyncEngine, SyncOptions};
//!
//! fn sync() -> pbsync_core::Result<()> {
//!     let engine = SyncEngine::new("/path/to/workspace", SyncOptions::default())?;
//!     let outcome = engine.run()?;
//!     println!("updated {} files", outcome.updated);
//!     Ok(())
//! }
//! ```

pub mod bazel;
pub mod config;
pub mod error;
pub mod generator;
pub mod parser_cache;
pub mod rule_file;
pub mod sync;

pub use bazel::{BazelBinResolver, parse_bazel_info};
pub use config::SyncConfig;
pub use error::{Error, ParseError, ParseResult, Result};
pub use generator::{
    ArtifactLocator, GenerationRule, GeneratorKind, GoProtoLibrary, LocateContext, SyncPair,
    TsProtoLibrary,
};
pub use parser_cache::RuleFileCache;
pub use rule_file::RuleFile;
pub use sync::{SyncEngine, SyncOptions, SyncOutcome};
