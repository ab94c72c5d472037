//! Per-workspace configuration from `.pbsync.toml`
//!
//! ```toml
//! jobs = 8
//! bazel_command = "bazelisk"
//! bazel_bin = "/abs/or/relative/bin"
//! disk_cache = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = ".pbsync.toml";

fn default_bazel_command() -> String {
    "bazel".to_string()
}

fn default_true() -> bool {
    true
}

/// Settings read from `.pbsync.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Worker threads; defaults to the available parallelism.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Command used for `bazel info`.
    #[serde(default = "default_bazel_command")]
    pub bazel_command: String,

    /// Fixed output directory, bypassing discovery.
    #[serde(default)]
    pub bazel_bin: Option<PathBuf>,

    /// Whether to persist the resolved output directory across runs.
    #[serde(default = "default_true")]
    pub disk_cache: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            bazel_command: default_bazel_command(),
            bazel_bin: None,
            disk_cache: true,
        }
    }
}

impl SyncConfig {
    /// Load `<root>/.pbsync.toml`, or the defaults when it does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let config = pbsync_fs::config::load_toml_optional(&path).map_err(Error::Config)?;
        match config {
            Some(config) => {
                tracing::debug!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
