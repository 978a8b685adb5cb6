//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated config directory and
//! verify outputs.

use std::io::Write;
use std::process::{Command, Stdio};

/// Run a CLI command with `stdin` piped in and return output.
fn run_cli_with_input(config_dir: &std::path::Path, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_workbreak"))
        .args(args)
        .env("WORKBREAK_CONFIG_DIR", config_dir)
        .env_remove("WORKBREAK_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli(config_dir: &std::path::Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(config_dir, args, "")
}

#[test]
fn test_format() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["format", "3723450"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "01:02:03.45");
}

#[test]
fn test_config_list_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("config list prints JSON");
    assert_eq!(json["ticks"]["notification_check_ms"], 20_000);
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "reminder.locale", "sk-SK"]);
    assert_eq!(code, 0, "config set failed");
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "reminder.locale"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "sk-SK");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "reminder.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"), "stderr was: {stderr}");
}

#[test]
fn test_config_set_invalid_value_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "ticks.display_ms", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("ticks.display_ms"), "stderr was: {stderr}");
}

#[test]
fn test_run_session_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) =
        run_cli_with_input(dir.path(), &["run", "--json", "--silent"], "\n\ns\n");
    assert_eq!(code, 0, "run failed: {stderr}");

    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("summary is JSON");
    let intervals = summary["intervals"].as_array().expect("intervals array");
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0]["working"], false);
    assert_eq!(intervals[1]["working"], true);
    assert_eq!(intervals[0]["end"], intervals[1]["start"]);
    assert_eq!(summary["reminders"], 0);
}

#[test]
fn test_run_session_ends_on_eof() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli_with_input(dir.path(), &["run", "--json", "--silent"], "\n");
    assert_eq!(code, 0, "run failed: {stderr}");
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("summary is JSON");
    assert_eq!(summary["intervals"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_run_can_close_open_interval_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &["config", "set", "session.close_open_interval_on_save", "true"],
    );
    assert_eq!(code, 0);
    let (stdout, stderr, code) = run_cli_with_input(dir.path(), &["run", "--json", "--silent"], "\ns\n");
    assert_eq!(code, 0, "run failed: {stderr}");
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("summary is JSON");
    assert_eq!(summary["intervals"].as_array().map(Vec::len), Some(2));
}
