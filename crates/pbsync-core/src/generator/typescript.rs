//! `ts_proto_library` artifacts: one `.d.ts` declaration file per rule.

use super::{ArtifactLocator, LocateContext, SyncPair};
use crate::Result;

/// A `ts_proto_library` rule. It carries no extra metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsProtoLibrary;

impl TsProtoLibrary {
    pub const RULE_KIND: &'static str = "ts_proto_library";
}

impl ArtifactLocator for TsProtoLibrary {
    fn locate(&self, rule_name: &str, ctx: &LocateContext<'_>) -> Result<Vec<SyncPair>> {
        let dir = ctx.proto_dir()?;
        let file_name = format!("{rule_name}.d.ts");

        Ok(vec![SyncPair {
            src: ctx.bazel_bin.join(dir).join(&file_name),
            dest: ctx.workspace_root.join(dir).join(&file_name),
        }])
    }
}
