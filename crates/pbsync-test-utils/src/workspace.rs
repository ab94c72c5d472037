//! [`TestWorkspace`] builder for pbsync test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::git;

/// Minimal proto source written by [`TestWorkspace::add_proto`].
pub const PROTO_SOURCE: &str = "syntax = \"proto3\";\n";

/// A temporary Bazel workspace inside a git repository.
///
/// The fake output tree lives at `<root>/bazel-bin` as a plain directory,
/// which the resolver picks up the same way it would the real symlink. It
/// is git-ignored, like in a real workspace.
///
/// # Example
///
/// ```rust,no_run
/// use pbsync_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// let import_path = "github.com/acme/widgets/gen/user";
/// ws.add_go_package("api", "user", import_path);
/// ws.add_go_artifact("api", "user_go_proto", import_path, "user.pb.go", "package user");
/// ```
pub struct TestWorkspace {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// A git repository with a `MODULE.bazel` marker and a `.gitignore`
    /// for the `bazel-*` convenience links.
    pub fn new() -> Self {
        let ws = Self::empty();
        git::real_git_repo(ws.root());
        ws.write("MODULE.bazel", "module(name = \"test\")\n");
        ws.write(".gitignore", "/bazel-*\n");
        ws
    }

    /// An empty temporary directory: no marker, no git repository.
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = pbsync_fs::canonicalize(temp_dir.path()).unwrap();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Canonical root of the workspace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The fake output tree.
    pub fn bazel_bin(&self) -> PathBuf {
        self.root.join("bazel-bin")
    }

    /// Absolute path of `relative`.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `<package>/BUILD`.
    pub fn add_build(&self, package: &str, content: &str) -> PathBuf {
        self.write(&join(package, "BUILD"), content)
    }

    /// Write a minimal proto at `relative`.
    pub fn add_proto(&self, relative: &str) -> PathBuf {
        self.write(relative, PROTO_SOURCE)
    }

    /// Write `content` at `relative` inside the output tree.
    pub fn add_artifact(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        self.write(&join("bazel-bin", relative), content)
    }

    /// Write a Go artifact where `go_proto_library` `rule` in `package`
    /// puts it.
    pub fn add_go_artifact(
        &self,
        package: &str,
        rule: &str,
        import_path: &str,
        file_name: &str,
        content: impl AsRef<[u8]>,
    ) -> PathBuf {
        let relative = format!("{}/{import_path}/{file_name}", join(package, &format!("{rule}_")));
        self.add_artifact(&relative, content)
    }

    /// Write the `.d.ts` artifact of `ts_proto_library` `rule` in `package`.
    pub fn add_ts_artifact(&self, package: &str, rule: &str, content: impl AsRef<[u8]>) -> PathBuf {
        self.add_artifact(&join(package, &format!("{rule}.d.ts")), content)
    }

    /// A package with `<name>.proto`, its `proto_library` and a
    /// `go_proto_library` named `<name>_go_proto`.
    pub fn add_go_package(&self, package: &str, name: &str, import_path: &str) {
        self.add_proto(&join(package, &format!("{name}.proto")));
        self.add_build(
            package,
            &format!(
                r#"proto_library(
    name = "{name}_proto",
    srcs = ["{name}.proto"],
)

go_proto_library(
    name = "{name}_go_proto",
    importpath = "{import_path}",
    proto = ":{name}_proto",
)
"#
            ),
        );
    }

    /// A package with `<name>.proto`, its `proto_library` and a
    /// `ts_proto_library` named `<name>_ts_proto`.
    pub fn add_ts_package(&self, package: &str, name: &str) {
        self.add_proto(&join(package, &format!("{name}.proto")));
        self.add_build(
            package,
            &format!(
                r#"proto_library(
    name = "{name}_proto",
    srcs = ["{name}.proto"],
)

ts_proto_library(
    name = "{name}_ts_proto",
    proto = ":{name}_proto",
)
"#
            ),
        );
    }

    /// Stage `relative` in the git index.
    pub fn stage(&self, relative: &str) {
        git::stage(&self.root, relative);
    }

    /// Stage every non-ignored file.
    pub fn stage_all(&self) {
        git::stage_all(&self.root);
    }

    /// Contents of `relative`.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Could not read file {}: {e}", path.display()))
    }

    /// Modification time of `relative`.
    pub fn modified(&self, relative: &str) -> std::time::SystemTime {
        fs::metadata(self.path(relative))
            .and_then(|m| m.modified())
            .unwrap()
    }

    /// Assert that `relative` exists.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert that `relative` does **not** exist.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }
}

fn join(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}/{name}")
    }
}
