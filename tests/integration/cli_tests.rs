//! Integration tests for the CLI binary.
//!
//! Verifies that the `pcalc` binary responds to basic flags and resolves
//! permissions from a fixture file.
//!
//! This test is registered as a [[test]] in the permcalc-cli crate
//! so that CARGO_BIN_EXE_pcalc is available.

use std::path::Path;
use std::process::Command;

/// Get a Command pointing to the `pcalc` binary.
fn pcalc_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pcalc"))
}

const FIXTURE: &str = r#"{
    "defaults": [ { "permission": "chat.*" } ],
    "holders": [
        {
            "id": "alice",
            "nodes": [
                { "permission": "foo.bar", "value": true },
                { "permission": "foo.*", "value": false },
                { "permission": "fly", "context": { "world": ["nether"] } }
            ]
        },
        { "id": "bob", "nodes": [ { "permission": "foo.bar", "value": false } ] }
    ]
}"#;

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("permissions.json");
    std::fs::write(&path, FIXTURE).expect("failed to write fixture");
    path
}

#[test]
fn cli_responds_to_help() {
    let output = pcalc_binary()
        .arg("--help")
        .output()
        .expect("failed to execute pcalc --help");

    assert!(
        output.status.success(),
        "pcalc --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("pcalc") || stdout.contains("Usage"),
        "pcalc --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = pcalc_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute pcalc");

    assert!(
        !output.status.success(),
        "pcalc should fail on unknown flags"
    );
}

#[test]
fn cli_check_resolves_wildcard() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = pcalc_binary()
        .args(["check", "foo.baz", "--holder", "alice", "--default", "true"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .expect("failed to execute pcalc check");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Result:     false"), "got: {stdout}");
    assert!(stdout.contains("Processor:  wildcard"), "got: {stdout}");
    assert!(stdout.contains("Decision:   DENY"), "got: {stdout}");
}

#[test]
fn cli_check_respects_context() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = pcalc_binary()
        .args(["check", "fly", "--holder", "alice"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Result:     undefined"), "got: {stdout}");

    let output = pcalc_binary()
        .args(["check", "fly", "--holder", "alice", "--context", "world=nether"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Result:     true"), "got: {stdout}");
}

#[test]
fn cli_check_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = pcalc_binary()
        .args(["check", "chat.send", "--holder", "bob"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Processor:  default"), "got: {stdout}");
}

#[test]
fn cli_search_lists_holders() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = pcalc_binary()
        .args(["search", "==", "foo.bar"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 matches across 2 holders"), "got: {stdout}");
    assert!(stdout.contains("> alice"), "got: {stdout}");
    assert!(stdout.contains("> bob"), "got: {stdout}");
}

#[test]
fn cli_unknown_holder_fails() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = pcalc_binary()
        .args(["check", "x", "--holder", "nobody"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "got: {stderr}");
}

#[test]
fn cli_check_echoes_normalized_permission() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = write_fixture(dir.path());

    let output = pcalc_binary()
        .args(["check", "  FOO.Baz ", "--holder", "alice"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Permission: foo.baz\n"), "got: {stdout}");

    // regex-shaped strings keep their pattern text
    let output = pcalc_binary()
        .args(["check", "R=Kit\\D+", "--holder", "alice"])
        .arg("--file")
        .arg(&fixture)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Permission: r=Kit\\D+\n"), "got: {stdout}");
}
