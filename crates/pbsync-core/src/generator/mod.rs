//! Generator kinds and where their artifacts live
//!
//! Each supported language generator is a rule kind in a BUILD file. A
//! [`GeneratorKind`] knows how to read its metadata from the rule and how to
//! map a proto to `(artifact in bazel-bin, destination in the source tree)`
//! pairs. Adding a language means adding a module here, a variant, and one
//! arm in each `match`.

mod go;
mod typescript;

use std::path::{Path, PathBuf};

use pbsync_build::Rule;

use crate::{ParseResult, Result};

pub use go::GoProtoLibrary;
pub use typescript::TsProtoLibrary;

/// One generated file and where it should be copied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SyncPair {
    /// Artifact inside the output tree
    pub src: PathBuf,
    /// Destination inside the source tree
    pub dest: PathBuf,
}

/// Inputs shared by every locator call for one proto.
#[derive(Debug, Clone, Copy)]
pub struct LocateContext<'a> {
    pub workspace_root: &'a Path,
    pub bazel_bin: &'a Path,
    pub proto: &'a Path,
}

impl LocateContext<'_> {
    /// Directory of the proto relative to the workspace root.
    pub fn proto_dir(&self) -> Result<&Path> {
        let relative = pbsync_fs::workspace_relative(self.workspace_root, self.proto)
            .ok_or_else(|| crate::Error::ProtoOutsideWorkspace {
                proto: self.proto.to_path_buf(),
                root: self.workspace_root.to_path_buf(),
            })?;
        Ok(relative.parent().unwrap_or(Path::new("")))
    }
}

/// Maps a generation rule to the artifacts it produces.
pub trait ArtifactLocator {
    /// Source/destination pairs for the rule named `rule_name`.
    ///
    /// A returned `src` may not exist yet; callers skip missing artifacts.
    fn locate(&self, rule_name: &str, ctx: &LocateContext<'_>) -> Result<Vec<SyncPair>>;
}

/// The closed set of supported generator rule kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorKind {
    Go(GoProtoLibrary),
    TypeScript(TsProtoLibrary),
}

impl GeneratorKind {
    /// Every rule kind that maps to a generator.
    pub const RULE_KINDS: &'static [&'static str] =
        &[GoProtoLibrary::RULE_KIND, TsProtoLibrary::RULE_KIND];

    /// Whether `kind` names a supported generator rule.
    pub fn is_generator_kind(kind: &str) -> bool {
        Self::RULE_KINDS.contains(&kind)
    }

    /// Build the generator for `rule`, reading its kind-specific attributes.
    ///
    /// Returns `Ok(None)` for rule kinds that are not generators.
    pub fn from_rule(rule: &Rule<'_>, build_file: &Path) -> ParseResult<Option<Self>> {
        let kind = match rule.kind().as_str() {
            GoProtoLibrary::RULE_KIND => Self::Go(GoProtoLibrary::from_rule(rule, build_file)?),
            TsProtoLibrary::RULE_KIND => Self::TypeScript(TsProtoLibrary),
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    /// The BUILD rule kind this generator is declared with.
    pub fn rule_kind(&self) -> &'static str {
        match self {
            Self::Go(_) => GoProtoLibrary::RULE_KIND,
            Self::TypeScript(_) => TsProtoLibrary::RULE_KIND,
        }
    }
}

impl ArtifactLocator for GeneratorKind {
    fn locate(&self, rule_name: &str, ctx: &LocateContext<'_>) -> Result<Vec<SyncPair>> {
        match self {
            Self::Go(go) => go.locate(rule_name, ctx),
            Self::TypeScript(ts) => ts.locate(rule_name, ctx),
        }
    }
}

/// A generator rule declared in a BUILD file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRule {
    /// The generator rule's own `name`
    pub name: String,
    /// Name of the `proto_library` it generates from
    pub proto_rule: String,
    pub kind: GeneratorKind,
}

impl GenerationRule {
    pub fn locate(&self, ctx: &LocateContext<'_>) -> Result<Vec<SyncPair>> {
        self.kind.locate(&self.name, ctx)
    }
}
