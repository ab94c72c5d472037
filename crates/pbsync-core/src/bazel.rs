//! Locating the Bazel output tree (`bazel-bin`) for a workspace
//!
//! Resolution order:
//!
//! 1. An explicit override
//! 2. The `<root>/bazel-bin` convenience symlink
//! 3. The persisted disk cache
//! 4. `bazel info --show_make_env`, whose answer is then cached on disk
//!
//! `bazel info` is slow, so results are memoized per root for the life of
//! the resolver as well.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError};

use pbsync_fs::{BAZEL_BIN_LINK, DiskCache};

use crate::{Error, Result};

const DEFAULT_BAZEL_COMMAND: &str = "bazel";
const BAZEL_BIN_KEY: &str = "bazel-bin";

/// Resolves and memoizes the output directory per workspace root.
#[derive(Debug)]
pub struct BazelBinResolver {
    bazel_command: String,
    override_dir: Option<PathBuf>,
    disk_cache: Option<DiskCache>,
    resolved: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl BazelBinResolver {
    pub fn new() -> Self {
        Self {
            bazel_command: DEFAULT_BAZEL_COMMAND.to_string(),
            override_dir: None,
            disk_cache: None,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Command used to query Bazel. Whitespace-separated words after the
    /// program are passed as leading arguments.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.bazel_command = command.into();
        self
    }

    /// Skip discovery and always use `dir`. Relative paths are taken from
    /// the workspace root.
    pub fn with_override(mut self, dir: Option<PathBuf>) -> Self {
        self.override_dir = dir;
        self
    }

    pub fn with_disk_cache(mut self, cache: Option<DiskCache>) -> Self {
        self.disk_cache = cache;
        self
    }

    /// The `bazel-bin` directory for `root`.
    ///
    /// Concurrent callers for the same resolver are serialized, so at most
    /// one `bazel info` runs at a time.
    pub fn resolve(&self, root: &Path) -> Result<PathBuf> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dir) = resolved.get(root) {
            return Ok(dir.clone());
        }

        let dir = self.compute(root)?;
        tracing::debug!(root = %root.display(), bazel_bin = %dir.display(), "Resolved bazel-bin");
        resolved.insert(root.to_path_buf(), dir.clone());
        Ok(dir)
    }

    fn compute(&self, root: &Path) -> Result<PathBuf> {
        if let Some(dir) = &self.override_dir {
            return Ok(root.join(dir));
        }

        let link = root.join(BAZEL_BIN_LINK);
        if link.is_dir() {
            match pbsync_fs::canonicalize(&link) {
                Ok(dir) => return Ok(dir),
                Err(e) => {
                    tracing::debug!(
                        link = %link.display(),
                        error = %e,
                        "Ignoring unusable bazel-bin link"
                    )
                }
            }
        }

        let key = cache_key(root);
        if let Some(cache) = &self.disk_cache
            && let Some(cached) = cache.get(&key)?
        {
            let dir = PathBuf::from(cached.trim());
            if dir.is_dir() {
                return Ok(dir);
            }
            tracing::debug!(cached = %dir.display(), "Cached bazel-bin no longer exists");
            cache.remove(&key)?;
        }

        let dir = self.query_bazel(root)?;
        if let Some(cache) = &self.disk_cache {
            cache.set(&key, &dir.to_string_lossy())?;
        }
        Ok(dir)
    }

    fn query_bazel(&self, root: &Path) -> Result<PathBuf> {
        let mut words = self.bazel_command.split_whitespace();
        let program = words.next().unwrap_or(DEFAULT_BAZEL_COMMAND);

        tracing::info!(command = %self.bazel_command, root = %root.display(), "Running bazel info");
        let output = Command::new(program)
            .args(words)
            .args(["info", "--show_make_env"])
            .current_dir(root)
            .output()
            .map_err(|source| Error::CommandSpawn {
                command: self.bazel_command.clone(),
                root: root.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: format!("{} info --show_make_env", self.bazel_command),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_bazel_info(&stdout)
            .map(PathBuf::from)
            .ok_or_else(|| Error::MissingBazelBinEntry {
                command: self.bazel_command.clone(),
            })
    }
}

impl Default for BazelBinResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Disk cache key for the output directory of `root`.
fn cache_key(root: &Path) -> String {
    let root = root.to_string_lossy();
    pbsync_fs::checksum::cache_key([BAZEL_BIN_KEY, root.as_ref()])
}

/// The `bazel-bin` value from `bazel info --show_make_env` output.
///
/// Takes the first line that is exactly two whitespace-separated fields
/// with `bazel-bin:` first.
pub fn parse_bazel_info(output: &str) -> Option<&str> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some("bazel-bin:"), Some(value), None) => Some(value),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_bazel_bin_line() {
        let output = "\
bazel-genfiles: /cache/out/bin
bazel-bin: /cache/execroot/_main/bazel-out/k8-fastbuild/bin
bazel-testlogs: /cache/out/testlogs
";
        assert_eq!(
            parse_bazel_info(output),
            Some("/cache/execroot/_main/bazel-out/k8-fastbuild/bin")
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::other_keys("output_base: /x\nrelease: 7.0\n")]
    #[case::extra_field("bazel-bin: /a /b\n")]
    #[case::no_colon("bazel-bin /a\n")]
    #[case::missing_value("bazel-bin:\n")]
    fn rejects_malformed_output(#[case] output: &str) {
        assert_eq!(parse_bazel_info(output), None);
    }

    #[test]
    fn first_matching_line_wins() {
        let output = "bazel-bin: /first\nbazel-bin: /second\n";
        assert_eq!(parse_bazel_info(output), Some("/first"));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(parse_bazel_info("  bazel-bin:\t/x  \r\n"), Some("/x"));
    }

    #[test]
    fn override_wins() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("bazel-bin")).unwrap();

        let resolver = BazelBinResolver::new().with_override(Some(PathBuf::from("/custom/bin")));
        assert_eq!(resolver.resolve(root.path()).unwrap(), Path::new("/custom/bin"));
    }

    #[test]
    fn relative_override_is_joined_to_root() {
        let resolver = BazelBinResolver::new().with_override(Some(PathBuf::from("out/bin")));
        assert_eq!(
            resolver.resolve(Path::new("/ws")).unwrap(),
            Path::new("/ws/out/bin")
        );
    }

    #[test]
    fn convenience_directory_is_used() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("bazel-bin")).unwrap();

        let resolver = BazelBinResolver::new().with_command("definitely-not-bazel-xyz");
        let dir = resolver.resolve(root.path()).unwrap();
        assert_eq!(dir, pbsync_fs::canonicalize(&root.path().join("bazel-bin")).unwrap());
    }

    #[test]
    fn disk_cache_hit_skips_bazel() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(cache_dir.path());
        cache
            .set(&cache_key(root.path()), &out.path().to_string_lossy())
            .unwrap();

        let resolver = BazelBinResolver::new()
            .with_command("definitely-not-bazel-xyz")
            .with_disk_cache(Some(cache));
        assert_eq!(resolver.resolve(root.path()).unwrap(), out.path());
    }

    #[test]
    fn stale_disk_cache_entry_is_evicted() {
        let root = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(cache_dir.path());
        let key = cache_key(root.path());
        cache.set(&key, "/no/longer/there").unwrap();

        let resolver = BazelBinResolver::new()
            .with_command("definitely-not-bazel-xyz")
            .with_disk_cache(Some(cache.clone()));
        let err = resolver.resolve(root.path()).unwrap_err();

        assert!(matches!(err, Error::CommandSpawn { .. }), "{err:?}");
        assert_eq!(cache.get(&key).unwrap(), None);
    }

    #[test]
    fn spawn_failure_names_the_command() {
        let root = tempfile::tempdir().unwrap();
        let resolver = BazelBinResolver::new().with_command("definitely-not-bazel-xyz");

        let err = resolver.resolve(root.path()).unwrap_err();
        let Error::CommandSpawn { command, .. } = &err else {
            panic!("expected CommandSpawn, got {err:?}");
        };
        assert_eq!(command, "definitely-not-bazel-xyz");
        let message = err.to_string();
        assert!(message.contains("definitely-not-bazel-xyz"), "{message}");
        assert!(message.contains(&root.path().display().to_string()), "{message}");
    }

    /// A `sh <script>` command standing in for bazel.
    #[cfg(unix)]
    fn fake_bazel(dir: &Path, script: &str) -> String {
        let path = dir.join("fake-bazel.sh");
        std::fs::write(&path, format!("{script}\n")).unwrap();
        format!("sh {}", path.display())
    }

    #[cfg(unix)]
    #[test]
    fn queries_bazel_and_caches_result() {
        let root = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let script = fake_bazel(
            tools.path(),
            &format!(
                "[ \"$1 $2\" = \"info --show_make_env\" ] || exit 9\necho \"bazel-bin: {}\"",
                out.path().display()
            ),
        );

        let resolver = BazelBinResolver::new()
            .with_command(script)
            .with_disk_cache(Some(DiskCache::new(cache_dir.path())));
        assert_eq!(resolver.resolve(root.path()).unwrap(), out.path());

        let cached = DiskCache::new(cache_dir.path())
            .get(&cache_key(root.path()))
            .unwrap();
        assert_eq!(cached.as_deref(), Some(out.path().to_string_lossy().as_ref()));
    }

    #[cfg(unix)]
    #[test]
    fn resolution_is_memoized_per_root() {
        let root = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let calls = tools.path().join("calls");
        let script = fake_bazel(
            tools.path(),
            &format!("echo x >> {}\necho \"bazel-bin: /out\"", calls.display()),
        );

        let resolver = BazelBinResolver::new().with_command(script);
        for _ in 0..3 {
            assert_eq!(resolver.resolve(root.path()).unwrap(), Path::new("/out"));
        }
        assert_eq!(std::fs::read_to_string(&calls).unwrap().lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_command_failed() {
        let root = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let script = fake_bazel(tools.path(), "echo 'not a workspace' >&2\nexit 2");

        let err = BazelBinResolver::new()
            .with_command(script)
            .resolve(root.path())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CommandFailed { code: Some(2), ref stderr, .. } if stderr == "not a workspace"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn missing_entry_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let script = fake_bazel(tools.path(), "echo 'output_base: /x'");

        let err = BazelBinResolver::new()
            .with_command(script)
            .resolve(root.path())
            .unwrap_err();
        assert!(matches!(err, Error::MissingBazelBinEntry { .. }));
    }
}
