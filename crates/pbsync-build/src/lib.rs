//! BUILD file parsing for pbsync.
//!
//! Parses the subset of Starlark that Bazel accepts in BUILD files and
//! exposes the top-level rule calls with typed attribute accessors. This is
//! not an interpreter: macros are not expanded and variables are not
//! resolved, so only literal attribute values are visible.
//!
//! ```
//! use pbsync_build::BuildFile;
//!
//! let file = BuildFile::parse("BUILD", r#"
//! proto_library(
//!     name = "thing_proto",
//!     srcs = ["thing.proto"],
//! )
//! "#).unwrap();
//!
//! let rule = file.rules_of_kind("proto_library").next().unwrap();
//! assert_eq!(rule.name(), "thing_proto");
//! assert_eq!(rule.attr_strings("srcs"), Some(vec!["thing.proto"]));
//! ```

pub mod build_file;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod syntax;

pub use build_file::{BuildFile, Rule};
pub use error::{Error, Result};
pub use syntax::{Arg, Call, Expr, Position, Stmt};
