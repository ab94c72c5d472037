//! `go_proto_library` artifacts: every `*.pb.go` file under the rule's
//! import path in the output tree, copied to the package directory the
//! import path names inside this repository.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use pbsync_build::Rule;
use regex::Regex;

use super::{ArtifactLocator, LocateContext, SyncPair};
use crate::{Error, ParseError, ParseResult, Result};

/// `github.com/<org>/<repo>/`, matched lazily so nested orgs stay intact.
static GITHUB_REPO_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^github\.com/(.+?)/(.+?)/").unwrap());

const GENERATED_SUFFIX: &str = ".pb.go";

/// A `go_proto_library` rule and its Go import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoProtoLibrary {
    pub import_path: String,
}

impl GoProtoLibrary {
    pub const RULE_KIND: &'static str = "go_proto_library";

    pub(crate) fn from_rule(rule: &Rule<'_>, build_file: &Path) -> ParseResult<Self> {
        let import_path = rule
            .attr_string("importpath")
            .ok_or_else(|| ParseError::MissingImportPath {
                path: build_file.to_path_buf(),
                rule: rule.name().to_string(),
            })?;
        Ok(Self {
            import_path: import_path.to_string(),
        })
    }

    /// The import path with its `github.com/<org>/<repo>/` prefix removed.
    pub fn workspace_dir(&self, rule_name: &str) -> Result<&str> {
        GITHUB_REPO_PREFIX
            .find(&self.import_path)
            .map(|m| &self.import_path[m.end()..])
            .ok_or_else(|| Error::UnsupportedImportPath {
                rule: rule_name.to_string(),
                import_path: self.import_path.clone(),
            })
    }
}

impl ArtifactLocator for GoProtoLibrary {
    fn locate(&self, rule_name: &str, ctx: &LocateContext<'_>) -> Result<Vec<SyncPair>> {
        let dest_dir = ctx.workspace_root.join(self.workspace_dir(rule_name)?);
        let src_dir = ctx
            .bazel_bin
            .join(ctx.proto_dir()?)
            .join(format!("{rule_name}_"))
            .join(&self.import_path);

        let entries = match fs::read_dir(&src_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %src_dir.display(), "No generated Go output yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(pbsync_fs::Error::io(&src_dir, e).into()),
        };

        let mut pairs = Vec::new();
        for entry in entries {
            let src = entry.map_err(|e| pbsync_fs::Error::io(&src_dir, e))?.path();
            let Some(file_name) = pbsync_fs::file_name_str(&src) else {
                continue;
            };
            if !file_name.ends_with(GENERATED_SUFFIX) || !src.is_file() {
                continue;
            }
            let dest = dest_dir.join(file_name);
            pairs.push(SyncPair { src, dest });
        }
        pairs.sort();

        Ok(pairs)
    }
}
