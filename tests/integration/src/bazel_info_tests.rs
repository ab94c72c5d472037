//! Output directory discovery through `bazel info`
//!
//! These workspaces have no `bazel-bin` link, so the engine has to ask a
//! stand-in bazel where the outputs are.

use std::fs;
use std::path::Path;

use pbsync_core::{BazelBinResolver, Error, SyncEngine, SyncOptions};
use pbsync_fs::DiskCache;
use pbsync_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A `sh <script>` command that reports `bin_dir` and logs each call to
/// `calls`.
fn fake_bazel(dir: &Path, bin_dir: &Path, calls: &Path) -> String {
    let script = dir.join("bazel.sh");
    fs::write(
        &script,
        format!(
            "echo call >> {calls}\n\
             echo 'BINDIR: ignored'\n\
             echo 'bazel-bin: {bin}'\n\
             echo 'bazel-genfiles: {bin}'\n",
            calls = calls.display(),
            bin = bin_dir.display(),
        ),
    )
    .unwrap();
    format!("sh {}", script.display())
}

fn call_count(calls: &Path) -> usize {
    fs::read_to_string(calls)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

struct Fixture {
    ws: TestWorkspace,
    tools: TempDir,
    out: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let ws = TestWorkspace::new();
        for i in 0..5 {
            let package = format!("web/p{i}");
            ws.add_ts_package(&package, "msg");
        }
        let out = tempfile::tempdir().unwrap();
        for i in 0..5 {
            let artifact = out.path().join(format!("web/p{i}/msg_ts_proto.d.ts"));
            fs::create_dir_all(artifact.parent().unwrap()).unwrap();
            fs::write(artifact, format!("export const P = {i};\n")).unwrap();
        }
        Self {
            ws,
            tools: tempfile::tempdir().unwrap(),
            out,
        }
    }

    fn calls(&self) -> std::path::PathBuf {
        self.tools.path().join("calls")
    }

    fn command(&self) -> String {
        fake_bazel(self.tools.path(), self.out.path(), &self.calls())
    }
}

#[test]
fn test_bazel_info_is_queried_once_per_run() {
    let fx = Fixture::new();
    let options = SyncOptions {
        jobs: Some(4),
        disk_cache: false,
        bazel_command: fx.command(),
        ..SyncOptions::default()
    };

    let outcome = SyncEngine::new(fx.ws.root(), options).unwrap().run().unwrap();

    assert_eq!(outcome.updated, 5);
    assert_eq!(call_count(&fx.calls()), 1);
    assert_eq!(fx.ws.read("web/p3/msg_ts_proto.d.ts"), "export const P = 3;\n");
}

#[test]
fn test_disk_cache_skips_bazel_on_later_runs() {
    let fx = Fixture::new();
    let cache_dir = tempfile::tempdir().unwrap();
    let options = SyncOptions {
        disk_cache: false,
        bazel_command: fx.command(),
        ..SyncOptions::default()
    };

    for _ in 0..3 {
        let resolver = BazelBinResolver::new()
            .with_command(fx.command())
            .with_disk_cache(Some(DiskCache::new(cache_dir.path())));
        SyncEngine::new(fx.ws.root(), options.clone())
            .unwrap()
            .with_resolver(resolver)
            .run()
            .unwrap();
    }

    assert_eq!(call_count(&fx.calls()), 1);
}

#[test]
fn test_stale_cache_entry_is_requeried() {
    let fx = Fixture::new();
    let cache_dir = tempfile::tempdir().unwrap();
    let resolver = || {
        BazelBinResolver::new()
            .with_command(fx.command())
            .with_disk_cache(Some(DiskCache::new(cache_dir.path())))
    };

    resolver().resolve(fx.ws.root()).unwrap();
    // A new output base after `bazel clean --expunge`.
    let moved = fx.tools.path().join("moved-out");
    fs::rename(fx.out.path(), &moved).unwrap();
    fake_bazel(fx.tools.path(), &moved, &fx.calls());

    let resolved = resolver().resolve(fx.ws.root()).unwrap();
    assert_eq!(resolved, moved);
    assert_eq!(call_count(&fx.calls()), 2);
}

#[test]
fn test_failing_bazel_fails_the_run() {
    let fx = Fixture::new();
    let script = fx.tools.path().join("broken.sh");
    fs::write(&script, "echo 'no workspace here' >&2\nexit 2\n").unwrap();
    let options = SyncOptions {
        disk_cache: false,
        bazel_command: format!("sh {}", script.display()),
        ..SyncOptions::default()
    };

    let err = SyncEngine::new(fx.ws.root(), options).unwrap().run().unwrap_err();
    let Error::CommandFailed { code, stderr, .. } = &err else {
        panic!("expected CommandFailed, got {err:?}");
    };
    assert_eq!(*code, Some(2));
    assert_eq!(stderr, "no workspace here");
}
