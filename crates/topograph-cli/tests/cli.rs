//! End-to-end tests for the topograph binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
[engine]
query_time_limit_secs = 10

[[catalog.edge_rules]]
from = "vserver"
to = "l-interface"
label = "has"
multiplicity = "ONE2MANY"
dependent = true

[[catalog.edge_rules]]
from = "pserver"
to = "vserver"
label = "hosts"
multiplicity = "ONE2MANY"
"#;

/// A `vs-svc` model (vserver -> l-interface) and one instance of it,
/// hosted on a pserver over an `up`-tagged edge
const GRAPH: &str = r#"{
  "vertices": [
    {"id": "w-vs", "node_type": "model", "properties": {"model-id": "w-vs", "model-version": "1.0", "model-type": "widget", "model-name": "vserver"}},
    {"id": "w-li", "node_type": "model", "properties": {"model-id": "w-li", "model-version": "1.0", "model-type": "widget", "model-name": "l-interface"}},
    {"id": "vs-svc", "node_type": "model", "properties": {"model-id": "vs-svc", "model-version": "1.0", "model-type": "service", "model-name": "vs-svc"}},
    {"id": "e-vs", "node_type": "model-element", "properties": {"model-element-uuid": "e-vs", "new-data-del-flag": "T"}},
    {"id": "e-li", "node_type": "model-element", "properties": {"model-element-uuid": "e-li", "new-data-del-flag": "T"}},
    {"id": "p1", "node_type": "pserver", "properties": {"hostname": "HOST1"}},
    {"id": "v1", "node_type": "vserver", "properties": {"vserver-name": "web"}},
    {"id": "i1", "node_type": "l-interface", "properties": {"interface-name": "eth0"}}
  ],
  "edges": [
    {"out_id": "vs-svc", "in_id": "e-vs", "label": "startsWith"},
    {"out_id": "e-vs", "in_id": "w-vs", "label": "isA"},
    {"out_id": "e-li", "in_id": "w-li", "label": "isA"},
    {"out_id": "e-vs", "in_id": "e-li", "label": "connectsTo"},
    {"out_id": "v1", "in_id": "i1", "label": "has"},
    {"out_id": "p1", "in_id": "v1", "label": "hosts", "properties": {"up": true}}
  ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), CONFIG).unwrap();
        std::fs::write(dir.path().join("graph.json"), GRAPH).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("topograph").unwrap();
        cmd.arg("--config")
            .arg(self.path().join("config.toml"))
            .arg("--data-dir")
            .arg(self.path().join("data"));
        cmd
    }

    fn imported() -> Self {
        let ws = Self::new();
        ws.cmd()
            .arg("import")
            .arg(ws.path().join("graph.json"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 8 vertices and 6 edges"));
        ws
    }
}

#[test]
fn test_help() {
    Command::cargo_bin("topograph")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("named-query"))
        .stdout(predicate::str::contains("collect-tagged"));
}

#[test]
fn test_import_twice_requires_merge() {
    let ws = Workspace::imported();
    ws.cmd()
        .arg("import")
        .arg(ws.path().join("graph.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--merge"));
}

#[test]
fn test_topology() {
    let ws = Workspace::imported();
    ws.cmd()
        .args(["topology", "--model", "vs-svc", "--model-version", "1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vserver -> l-interface"));
}

#[test]
fn test_collect_instance() {
    let ws = Workspace::imported();
    ws.cmd()
        .args(["collect", "v1", "--model", "vs-svc", "--model-version", "1.0"])
        .assert()
        .success()
        .stdout("vserver v1\n  l-interface i1\n");
}

#[test]
fn test_collect_unknown_model_fails() {
    let ws = Workspace::imported();
    ws.cmd()
        .args(["collect", "v1", "--model", "nope", "--model-version", "1.0"])
        .assert()
        .failure();
}

#[test]
fn test_delete_plan_then_delete() {
    let ws = Workspace::imported();
    ws.cmd()
        .args(["delete-plan", "v1", "--model", "vs-svc", "--model-version", "1.0", "--flags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vserver: true"))
        .stdout(predicate::str::contains("l-interface i1 [delete]"));

    ws.cmd()
        .args(["--format", "json", "delete", "v1", "--model", "vs-svc", "--model-version", "1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"i1\""))
        .stdout(predicate::str::contains("\"v1\""));

    // The removal is persisted
    ws.cmd()
        .args(["collect", "v1", "--model", "vs-svc", "--model-version", "1.0"])
        .assert()
        .failure();

    // Both vertices and every edge touching them went in one write
    let output = ws.cmd().arg("export").output().unwrap();
    let exported: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(exported["vertices"].as_array().unwrap().len(), 6);
    assert_eq!(exported["edges"].as_array().unwrap().len(), 4);
}

#[test]
fn test_find_top_with_case_retry() {
    let ws = Workspace::imported();
    ws.cmd()
        .args(["find-top", "pserver:hostname=host1", "--top", "vserver", "--tag", "up"])
        .assert()
        .success()
        .stdout("vserver v1\n");
}

#[test]
fn test_collect_tagged_json() {
    let ws = Workspace::imported();
    ws.cmd()
        .args(["-f", "json", "collect-tagged", "p1", "--tag", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"trail\": \"pserver|vserver\""));
}

#[test]
fn test_export_round_trip() {
    let ws = Workspace::imported();
    let out = ws.path().join("export.json");
    ws.cmd()
        .arg("export")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    let exported: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported["vertices"].as_array().unwrap().len(), 8);
    assert_eq!(exported["edges"].as_array().unwrap().len(), 6);
}

#[test]
fn test_export_to_stdout_is_json() {
    let ws = Workspace::imported();
    let output = ws.cmd().arg("export").output().unwrap();
    assert!(output.status.success());
    let exported: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(exported["vertices"].as_array().unwrap().len(), 8);
}

#[test]
fn test_config_set_get() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "set", "engine.max_levels", "20"])
        .assert()
        .success();
    ws.cmd()
        .args(["config", "get", "engine.max_levels"])
        .assert()
        .success()
        .stdout("20\n");
    ws.cmd()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 edge rules"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("topograph")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topograph"));
}
