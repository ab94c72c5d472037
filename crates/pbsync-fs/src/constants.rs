//! Constants and enums for Bazel workspace paths.

use std::path::Path;

/// The only BUILD file name that is consulted next to a proto file.
pub const BUILD_FILE_NAME: &str = "BUILD";

/// Convenience symlink Bazel creates at the workspace root.
pub const BAZEL_BIN_LINK: &str = "bazel-bin";

/// Files whose presence marks a directory as a Bazel workspace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceMarker {
    /// Legacy `WORKSPACE` file
    Workspace,
    /// `WORKSPACE.bazel` file
    WorkspaceBazel,
    /// Bzlmod `MODULE.bazel` file
    ModuleBazel,
}

impl WorkspaceMarker {
    /// All markers, in lookup order.
    pub const ALL: [WorkspaceMarker; 3] = [
        WorkspaceMarker::Workspace,
        WorkspaceMarker::WorkspaceBazel,
        WorkspaceMarker::ModuleBazel,
    ];

    /// Get the file name of the marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "WORKSPACE",
            Self::WorkspaceBazel => "WORKSPACE.bazel",
            Self::ModuleBazel => "MODULE.bazel",
        }
    }

    /// Find the first marker present in `root`, if any.
    pub fn detect(root: &Path) -> Option<WorkspaceMarker> {
        Self::ALL
            .into_iter()
            .find(|marker| root.join(marker.as_str()).is_file())
    }
}

impl AsRef<Path> for WorkspaceMarker {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for WorkspaceMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
