//! CLI end-to-end tests that invoke the compiled `pbsync` binary.

use assert_cmd::Command;
use pbsync_test_utils::TestWorkspace;
use predicates::prelude::*;
use pretty_assertions::assert_eq;

const IMPORT_PATH: &str = "github.com/acme/widgets/gen/user";

/// A `pbsync` command that never touches the user cache or a real bazel.
fn pbsync() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pbsync"));
    cmd.arg("--no-cache")
        .env("NO_COLOR", "1")
        .env_remove("PBSYNC_BAZEL_BIN")
        .env_remove("RUST_LOG");
    cmd
}

/// A workspace with one Go proto whose artifact has been built.
fn built_workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.add_go_package("api", "user", IMPORT_PATH);
    ws.add_go_artifact("api", "user_go_proto", IMPORT_PATH, "user.pb.go", "package user\n");
    ws
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn test_help_output() {
    pbsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--keep-going"))
        .stdout(predicate::str::contains("WORKSPACE_ROOT"));
}

#[test]
fn test_version_output() {
    pbsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pbsync"));
}

// ============================================================================
// Single workspace
// ============================================================================

#[test]
fn test_sync_copies_and_reports() {
    let ws = built_workspace();

    pbsync()
        .arg(ws.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("🔄 pbsync: updated: 1, up to date: 0"));

    assert_eq!(ws.read("gen/user/user.pb.go"), "package user\n");
}

#[test]
fn test_second_run_reports_up_to_date() {
    let ws = built_workspace();
    pbsync().arg(ws.root()).assert().success();

    pbsync()
        .arg(ws.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("pbsync: updated: 0, up to date: 1"))
        .stderr(predicate::str::contains("🔄").not());
}

#[test]
fn test_root_defaults_to_current_dir() {
    let ws = built_workspace();

    pbsync()
        .current_dir(ws.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("updated: 1"));

    ws.assert_file_exists("gen/user/user.pb.go");
}

#[test]
fn test_dry_run_writes_nothing() {
    let ws = built_workspace();

    pbsync()
        .arg("--dry-run")
        .arg(ws.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("would update: 1"));

    ws.assert_file_not_exists("gen/user/user.pb.go");
}

#[test]
fn test_json_output() {
    let ws = built_workspace();

    pbsync()
        .arg("--json")
        .arg(ws.root())
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "{\"updated\":1,\"up_to_date\":0,\"unresolved\":0}\n",
        ));
}

#[test]
fn test_bazel_bin_flag() {
    let ws = TestWorkspace::new();
    ws.add_ts_package("web", "user");
    ws.write("out/web/user_ts_proto.d.ts", "export {}\n");

    pbsync()
        .current_dir(ws.root())
        .args(["--bazel-bin", "out"])
        .assert()
        .success();

    assert_eq!(ws.read("web/user_ts_proto.d.ts"), "export {}\n");
}

#[test]
fn test_bazel_bin_env() {
    let ws = TestWorkspace::new();
    ws.add_ts_package("web", "user");
    let out = ws.write("out/web/user_ts_proto.d.ts", "export {}\n");

    pbsync()
        .env("PBSYNC_BAZEL_BIN", out.parent().unwrap().parent().unwrap())
        .arg(ws.root())
        .assert()
        .success();

    ws.assert_file_exists("web/user_ts_proto.d.ts");
}

#[test]
fn test_config_file_is_honored() {
    let ws = TestWorkspace::new();
    ws.add_ts_package("web", "user");
    ws.write("out/web/user_ts_proto.d.ts", "export {}\n");
    ws.write(".pbsync.toml", "bazel_bin = \"out\"\njobs = 2\n");

    pbsync().arg(ws.root()).assert().success();

    ws.assert_file_exists("web/user_ts_proto.d.ts");
}

#[test]
fn test_invalid_config_fails() {
    let ws = built_workspace();
    ws.write(".pbsync.toml", "no_such_key = 1\n");

    pbsync()
        .arg(ws.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(".pbsync.toml"));
}

#[test]
fn test_not_a_workspace_fails() {
    let dir = TestWorkspace::empty();

    pbsync()
        .arg(dir.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "error: failed to sync protos for workspace {}",
            dir.root().display()
        )));
}

#[test]
fn test_empty_artifact_fails() {
    let ws = TestWorkspace::new();
    ws.add_ts_package("web", "user");
    ws.add_ts_artifact("web", "user_ts_proto", "");

    pbsync()
        .arg(ws.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("user.proto"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let ws = built_workspace();

    pbsync()
        .arg("-v")
        .arg(ws.root())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Syncing protos"));
}

// ============================================================================
// Multiple workspaces
// ============================================================================

#[test]
fn test_multiple_roots_are_summed() {
    let a = built_workspace();
    let b = built_workspace();

    pbsync()
        .arg(a.root())
        .arg(b.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("updated: 2"));
}

/// A workspace whose only artifact is empty, which fails the sync.
fn broken_workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.add_ts_package("web", "user");
    ws.add_ts_artifact("web", "user_ts_proto", "");
    ws
}

#[test]
fn test_first_failure_stops_remaining_roots() {
    let bad = broken_workspace();
    let good = built_workspace();

    pbsync()
        .arg(bad.root())
        .arg(good.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "error: failed to sync protos for workspace {}",
            bad.root().display()
        )))
        .stderr(predicate::str::contains("pbsync: updated").not());

    good.assert_file_not_exists("gen/user/user.pb.go");
}

#[test]
fn test_keep_going_syncs_remaining_roots() {
    let bad = broken_workspace();
    let good = built_workspace();

    pbsync()
        .arg("--keep-going")
        .arg(bad.root())
        .arg(good.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "failed to sync protos for workspace {}",
            bad.root().display()
        )))
        .stderr(predicate::str::contains("pbsync: updated: 1"))
        .stderr(predicate::str::contains("1 of 2 workspaces failed to sync"));

    good.assert_file_exists("gen/user/user.pb.go");
}

#[test]
fn test_non_workspace_root_does_not_stop_other_roots() {
    let not_a_workspace = TestWorkspace::empty();
    let good = built_workspace();

    pbsync()
        .arg(not_a_workspace.root())
        .arg(good.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is not a Bazel workspace"))
        .stderr(predicate::str::contains("pbsync: updated: 1"))
        .stderr(predicate::str::contains("1 of 2 workspaces failed to sync"));

    good.assert_file_exists("gen/user/user.pb.go");
}

#[test]
fn test_missing_root_does_not_stop_other_roots() {
    let good = built_workspace();
    let missing = good.path("no/such/dir");

    pbsync()
        .arg(&missing)
        .arg(good.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is not a Bazel workspace"));

    good.assert_file_exists("gen/user/user.pb.go");
}

#[test]
fn test_invalid_config_does_not_stop_other_roots() {
    let misconfigured = built_workspace();
    misconfigured.write(".pbsync.toml", "jobs = [\n");
    let good = built_workspace();

    pbsync()
        .arg(misconfigured.root())
        .arg(good.root())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(".pbsync.toml"))
        .stderr(predicate::str::contains("pbsync: updated: 1"));

    misconfigured.assert_file_not_exists("gen/user/user.pb.go");
    good.assert_file_exists("gen/user/user.pb.go");
}
