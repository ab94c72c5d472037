//! Proto-to-generator index for one BUILD file
//!
//! A [`RuleFile`] answers "which generators produce code for this proto?"
//! using two maps built from the file's rules:
//!
//! - proto source name → owning `proto_library` name
//! - `proto_library` name → generator rules, in declaration order
//!
//! Only references within the same BUILD file (`proto = ":name"`) are
//! followed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use pbsync_build::BuildFile;

use crate::{ParseError, ParseResult};
use crate::generator::{GenerationRule, GeneratorKind};

const PROTO_LIBRARY: &str = "proto_library";

/// Immutable index over a parsed BUILD file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFile {
    path: PathBuf,
    definition_to_rule: HashMap<String, String>,
    rule_to_generators: HashMap<String, Vec<GenerationRule>>,
}

impl RuleFile {
    /// Read and index the BUILD file at `path`.
    pub fn parse(path: &Path) -> ParseResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
        Self::from_source(path, &content)
    }

    /// Index BUILD file `content`; `path` is used for naming and errors.
    pub fn from_source(path: &Path, content: &str) -> ParseResult<Self> {
        let build = BuildFile::parse(path.display().to_string(), content).map_err(|source| {
            ParseError::Syntax {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut index = Self {
            path: path.to_path_buf(),
            ..Self::default()
        };

        for rule in build.rules_of_kind(PROTO_LIBRARY) {
            let srcs = rule
                .attr_strings("srcs")
                .ok_or_else(|| ParseError::MissingSrcs {
                    path: path.to_path_buf(),
                    rule: rule.name().to_string(),
                })?;

            for src in srcs {
                let file = src.strip_prefix(':').unwrap_or(src);
                if let Some(first) = index.definition_to_rule.get(file) {
                    return Err(ParseError::DuplicateSource {
                        path: path.to_path_buf(),
                        file: file.to_string(),
                        first: first.clone(),
                        second: rule.name().to_string(),
                    });
                }
                index
                    .definition_to_rule
                    .insert(file.to_string(), rule.name().to_string());
            }
        }

        for rule in build.rules() {
            if !GeneratorKind::is_generator_kind(&rule.kind()) {
                continue;
            }

            let reference = rule
                .attr_string("proto")
                .ok_or_else(|| ParseError::MissingProtoAttr {
                    path: path.to_path_buf(),
                    rule: rule.name().to_string(),
                })?;
            let Some(proto_rule) = reference.strip_prefix(':') else {
                tracing::debug!(
                    build_file = %path.display(),
                    rule = %rule.name(),
                    reference,
                    "Skipping generator with a cross-package proto reference"
                );
                continue;
            };

            let Some(kind) = GeneratorKind::from_rule(&rule, path)? else {
                continue;
            };
            index
                .rule_to_generators
                .entry(proto_rule.to_string())
                .or_default()
                .push(GenerationRule {
                    name: rule.name().to_string(),
                    proto_rule: proto_rule.to_string(),
                    kind,
                });
        }

        tracing::debug!(
            build_file = %path.display(),
            protos = index.definition_to_rule.len(),
            proto_rules = index.rule_to_generators.len(),
            "Indexed BUILD file"
        );

        Ok(index)
    }

    /// The BUILD file this index was built from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `proto_library` that lists `file_name` in its `srcs`.
    pub fn proto_rule_for(&self, file_name: &str) -> Option<&str> {
        self.definition_to_rule.get(file_name).map(String::as_str)
    }

    /// Generators declared against the `proto_library` named `proto_rule`.
    pub fn generators_of(&self, proto_rule: &str) -> &[GenerationRule] {
        self.rule_to_generators
            .get(proto_rule)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Generators for the proto at `proto`, looked up by its file name.
    ///
    /// Empty when no `proto_library` in this file owns the proto, or when
    /// nothing generates from the owning rule.
    pub fn generators_for(&self, proto: &Path) -> &[GenerationRule] {
        pbsync_fs::file_name_str(proto)
            .and_then(|name| self.proto_rule_for(name))
            .map(|rule| self.generators_of(rule))
            .unwrap_or_default()
    }
}
