//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusloop"))
        .args(args)
        .env("FOCUSLOOP_DATA_DIR", data_dir)
        .env_remove("FOCUSLOOP_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command {:?} failed: {}", args, stderr);
    stdout
}

/// Every JSON document printed to stdout, in order.
fn json_documents(stdout: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout should be a stream of JSON documents")
}

fn snapshot(data_dir: &Path) -> Value {
    let docs = json_documents(&run_cli_success(data_dir, &["timer", "status"]));
    docs.into_iter()
        .last()
        .expect("status prints a snapshot")
}

#[test]
fn test_status_when_idle() {
    let dir = tempfile::tempdir().unwrap();
    let snap = snapshot(dir.path());
    assert_eq!(snap["type"], "state_snapshot");
    assert_eq!(snap["phase"]["state"], "idle");
    assert_eq!(snap["remaining_secs"], 0);
}

#[test]
fn test_start_status_stop() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(
        dir.path(),
        &["timer", "start", "Reading", "Coding", "--focus", "25", "--break", "5"],
    );
    let docs = json_documents(&out);
    assert_eq!(docs[0]["type"], "session_started");
    assert_eq!(docs[0]["items"], serde_json::json!(["Reading", "Coding"]));

    let snap = snapshot(dir.path());
    assert_eq!(snap["phase"]["state"], "focusing");
    assert_eq!(snap["phase"]["item"], "Reading");
    assert_eq!(snap["total_secs"], 1500);
    let remaining = snap["remaining_secs"].as_u64().unwrap();
    assert!(remaining > 1400 && remaining <= 1500);

    let out = run_cli_success(dir.path(), &["timer", "stop"]);
    assert_eq!(json_documents(&out)[0]["type"], "session_stopped");
    assert_eq!(snapshot(dir.path())["phase"]["state"], "idle");
}

#[test]
fn test_rejected_start_keeps_running_session() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["timer", "start", "Reading"]);

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(dir.path(), &["timer", "start", "Writing", "--focus", "0"]);
    assert_eq!(code, 1);

    let snap = snapshot(dir.path());
    assert_eq!(snap["phase"]["item"], "Reading");
}

#[test]
fn test_start_respects_max_items() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["config", "set", "timer.max_items", "2"]);
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start", "A", "B", "C"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("at most 2 items"));
}

#[test]
fn test_start_from_catalog_ids() {
    let dir = tempfile::tempdir().unwrap();
    let id = run_cli_success(dir.path(), &["items", "add", "Piano"]);
    run_cli_success(dir.path(), &["timer", "start", "--item-id", id.trim()]);
    assert_eq!(snapshot(dir.path())["phase"]["item"], "Piano");
}

#[test]
fn test_items_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let listed = json_documents(&run_cli_success(dir.path(), &["items", "list", "--json"]));
    assert_eq!(listed[0].as_array().unwrap().len(), 9);

    let id = run_cli_success(dir.path(), &["items", "add", "Piano"]);
    let id = id.trim();
    run_cli_success(dir.path(), &["items", "rename", id, "Guitar"]);
    let listed = json_documents(&run_cli_success(dir.path(), &["items", "list", "--json"]));
    let names: Vec<&str> = listed[0]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Guitar"));

    run_cli_success(dir.path(), &["items", "remove", id]);
    let (_, _, code) = run_cli(dir.path(), &["items", "remove", id]);
    assert_eq!(code, 1);
}

#[test]
fn test_history_empty() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli_success(dir.path(), &["history", "show", "Reading", "--json"]);
    assert_eq!(json_documents(&out)[0], serde_json::json!([]));
}

#[test]
fn test_config_get_set_list() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.focus_minutes"]).trim(),
        "25"
    );
    run_cli_success(dir.path(), &["config", "set", "timer.focus_minutes", "45"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.focus_minutes"]).trim(),
        "45"
    );
    let listed = run_cli_success(dir.path(), &["config", "list"]);
    assert!(listed.contains("[timer]"));
    assert!(listed.contains("focus_minutes = 45"));
    let listed = json_documents(&run_cli_success(dir.path(), &["config", "list", "--json"]));
    assert_eq!(listed[0]["timer"]["focus_minutes"], 45);

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);

    run_cli_success(dir.path(), &["config", "reset"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "timer.focus_minutes"]).trim(),
        "25"
    );
}

#[test]
fn test_start_uses_configured_defaults() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["config", "set", "timer.focus_minutes", "10"]);
    run_cli_success(dir.path(), &["timer", "start", "Reading"]);
    assert_eq!(snapshot(dir.path())["total_secs"], 600);
}

#[cfg(unix)]
#[test]
fn test_watch_exits_cleanly_on_interrupt() {
    let dir = tempfile::tempdir().unwrap();
    run_cli_success(dir.path(), &["timer", "start", "Reading"]);

    let mut child = Command::new(env!("CARGO_BIN_EXE_focusloop"))
        .args(["timer", "watch"])
        .env("FOCUSLOOP_DATA_DIR", dir.path())
        .env_remove("FOCUSLOOP_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn watch");
    std::thread::sleep(Duration::from_millis(1500));

    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());
    assert_eq!(child.wait().unwrap().code(), Some(0));

    assert_eq!(snapshot(dir.path())["phase"]["state"], "focusing");
}
