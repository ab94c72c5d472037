//! End-to-end sync of a realistic multi-package workspace
//!
//! Exercises the whole flow: git listing -> BUILD parsing -> bazel-bin
//! resolution -> artifact location -> copy.

use std::fs;

use pbsync_core::{RuleFile, SyncEngine, SyncOptions, SyncOutcome};
use pbsync_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;

const BILLING_IMPORT: &str = "github.com/acme/shop/gen/go/billing";

const BILLING_BUILD: &str = r#"
load("@rules_proto//proto:defs.bzl", "proto_library")
load("@io_bazel_rules_go//proto:def.bzl", "go_proto_library")
load("//tools/ts:defs.bzl", "ts_proto_library")

package(default_visibility = ["//visibility:public"])

PROTOS = [
    "invoice.proto",
    "payment.proto",
]

proto_library(
    name = "invoice_proto",
    srcs = ["invoice.proto"],
    deps = ["//common:money_proto"],
)

proto_library(
    name = "payment_proto",
    srcs = [
        "payment.proto",  # payments
    ],
    deps = [":invoice_proto"],
)

go_proto_library(
    name = "invoice_go_proto",
    importpath = "github.com/acme/shop/gen/go/billing",
    proto = ":invoice_proto",
    compilers = ["@io_bazel_rules_go//proto:go_grpc"],
)

ts_proto_library(
    name = "invoice_ts_proto",
    proto = ":invoice_proto",
)

ts_proto_library(
    name = "payment_ts_proto",
    proto = ":payment_proto",
)

filegroup(
    name = "all",
    srcs = PROTOS + select({
        "//conditions:default": [],
    }),
)
"#;

fn options() -> SyncOptions {
    SyncOptions {
        disk_cache: false,
        bazel_command: "pbsync-integration-no-bazel".to_string(),
        ..SyncOptions::default()
    }
}

fn shop_workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();

    ws.add_proto("services/billing/invoice.proto");
    ws.add_proto("services/billing/payment.proto");
    ws.add_build("services/billing", BILLING_BUILD);

    ws.add_go_package("common", "money", "github.com/acme/shop/gen/go/common");
    ws.add_ts_package("web/proto", "session");

    ws.add_go_artifact(
        "services/billing",
        "invoice_go_proto",
        BILLING_IMPORT,
        "invoice.pb.go",
        "package billing // invoice\n",
    );
    ws.add_go_artifact(
        "services/billing",
        "invoice_go_proto",
        BILLING_IMPORT,
        "invoice_grpc.pb.go",
        "package billing // grpc\n",
    );
    // Not a Go artifact; never copied.
    ws.add_go_artifact(
        "services/billing",
        "invoice_go_proto",
        BILLING_IMPORT,
        "invoice.pb.go.params",
        "x",
    );
    ws.add_ts_artifact("services/billing", "invoice_ts_proto", "export interface Invoice {}\n");
    ws.add_ts_artifact("services/billing", "payment_ts_proto", "export interface Payment {}\n");
    ws.add_go_artifact(
        "common",
        "money_go_proto",
        "github.com/acme/shop/gen/go/common",
        "money.pb.go",
        "package common\n",
    );
    ws.add_ts_artifact("web/proto", "session_ts_proto", "export interface Session {}\n");
    ws
}

#[test]
fn test_full_workspace_sync() {
    let ws = shop_workspace();
    ws.stage_all();

    let engine = SyncEngine::new(ws.root(), options()).unwrap();
    let outcome = engine.run().unwrap();

    assert_eq!(
        outcome,
        SyncOutcome {
            updated: 6,
            up_to_date: 0,
            unresolved: 0,
        }
    );
    assert_eq!(ws.read("gen/go/billing/invoice.pb.go"), "package billing // invoice\n");
    assert_eq!(ws.read("gen/go/billing/invoice_grpc.pb.go"), "package billing // grpc\n");
    ws.assert_file_not_exists("gen/go/billing/invoice.pb.go.params");
    assert_eq!(
        ws.read("services/billing/invoice_ts_proto.d.ts"),
        "export interface Invoice {}\n"
    );
    assert_eq!(
        ws.read("services/billing/payment_ts_proto.d.ts"),
        "export interface Payment {}\n"
    );
    assert_eq!(ws.read("gen/go/common/money.pb.go"), "package common\n");
    assert_eq!(ws.read("web/proto/session_ts_proto.d.ts"), "export interface Session {}\n");

    // Two protos share services/billing/BUILD.
    assert_eq!(engine.rule_files().parse_count(), 3);
}

#[test]
fn test_rebuild_after_change_updates_only_changed_files() {
    let ws = shop_workspace();
    SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();

    ws.add_ts_artifact(
        "services/billing",
        "payment_ts_proto",
        "export interface Payment { id: string }\n",
    );

    let outcome = SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.up_to_date, 5);
    assert_eq!(
        ws.read("services/billing/payment_ts_proto.d.ts"),
        "export interface Payment { id: string }\n"
    );
}

#[test]
fn test_hand_edited_output_is_restored() {
    let ws = shop_workspace();
    SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();

    ws.write("gen/go/common/money.pb.go", "package common // edited\n");

    let outcome = SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(ws.read("gen/go/common/money.pb.go"), "package common\n");
}

#[test]
fn test_rule_file_index_of_real_build_file() {
    let ws = shop_workspace();
    let rule_file = RuleFile::parse(&ws.path("services/billing/BUILD")).unwrap();

    assert_eq!(rule_file.proto_rule_for("invoice.proto"), Some("invoice_proto"));
    assert_eq!(rule_file.proto_rule_for("payment.proto"), Some("payment_proto"));

    let invoice: Vec<_> = rule_file
        .generators_of("invoice_proto")
        .iter()
        .map(|g| g.name.as_str())
        .collect();
    assert_eq!(invoice, vec!["invoice_go_proto", "invoice_ts_proto"]);
}

#[cfg(unix)]
#[test]
fn test_symlinked_bazel_bin_outside_workspace() {
    let out = tempfile::tempdir().unwrap();
    let ws = TestWorkspace::new();
    ws.add_ts_package("web", "user");

    let artifact = out.path().join("web/user_ts_proto.d.ts");
    fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    fs::write(&artifact, "export {}\n").unwrap();
    std::os::unix::fs::symlink(out.path(), ws.bazel_bin()).unwrap();

    let outcome = SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(ws.read("web/user_ts_proto.d.ts"), "export {}\n");
}

#[test]
fn test_workspace_in_subdirectory_of_repository() {
    let ws = TestWorkspace::new();
    fs::remove_file(ws.path("MODULE.bazel")).unwrap();
    ws.write("bazel/WORKSPACE", "");
    ws.write("bazel/.gitignore", "/bazel-*\n");
    ws.add_ts_package("bazel/web", "user");
    ws.write("bazel/bazel-bin/web/user_ts_proto.d.ts", "export {}\n");
    // Outside the workspace root; never listed.
    ws.add_ts_package("other", "user");

    let outcome = SyncEngine::new(ws.path("bazel"), options())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.updated, 1);
    ws.assert_file_exists("bazel/web/user_ts_proto.d.ts");
}

#[test]
fn test_concurrent_engines_on_one_workspace() {
    let ws = shop_workspace();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();
            });
        }
    });

    assert_eq!(ws.read("gen/go/common/money.pb.go"), "package common\n");
    let outcome = SyncEngine::new(ws.root(), options()).unwrap().run().unwrap();
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.up_to_date, 6);
}
