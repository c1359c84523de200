//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs.

use std::io::Write;
use std::process::{Command, Stdio};

/// Run a CLI command with the given stdin and return (stdout, stderr, code).
fn run_cli_with_input(args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new("cargo")
        .args(["run", "-q", "-p", "wakeguard-cli", "--"])
        .args(args)
        .env("WAKEGUARD_ENV", "dev")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli(args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(args, "")
}

/// Check if string contains substring
fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{}' to contain '{}'",
        haystack,
        needle
    );
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

#[test]
fn test_format_widens_hours() {
    let (stdout, _, code) = run_cli(&["format", "360000"]);
    assert_eq!(code, 0, "format failed");
    assert_eq!(stdout.trim(), "100:00:00");
}

#[test]
fn test_format_pads_fields() {
    let (stdout, _, code) = run_cli(&["format", "3661"]);
    assert_eq!(code, 0, "format failed");
    assert_eq!(stdout.trim(), "01:01:01");
}

#[test]
fn test_info_is_json() {
    let (stdout, _, code) = run_cli(&["info"]);
    assert_eq!(code, 0, "info failed");
    let info: serde_json::Value = serde_json::from_str(&stdout).expect("info prints JSON");
    assert_eq!(info["lock_backend"], "simulated");
    assert!(info["os"].is_string());
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let config: serde_json::Value = serde_json::from_str(&stdout).expect("config prints JSON");
    assert!(config.get("lock").is_some());
    assert!(config.get("clock").is_some());
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, stderr, code) = run_cli(&["config", "get", "lock.nope"]);
    assert_ne!(code, 0);
    assert_contains(&stderr, "unknown config key: lock.nope");
}

#[test]
fn test_config_set_rejects_zero_tick() {
    let (_, stderr, code) = run_cli(&["config", "set", "clock.tick_interval_ms", "0"]);
    assert_ne!(code, 0);
    assert_contains(&stderr, "clock.tick_interval_ms");

    let (stdout, _, code) = run_cli(&["config", "get", "clock.tick_interval_ms"]);
    assert_eq!(code, 0, "config get failed");
    assert_ne!(stdout.trim(), "0");
}

#[test]
fn test_run_explicit_toggle() {
    let (stdout, _, code) = run_cli_with_input(
        &["run", "--mode", "explicit", "--output", "json"],
        "on\nstatus\noff\nstatus\nquit\n",
    );
    assert_eq!(code, 0, "run failed");

    let lines = json_lines(&stdout);
    let statuses: Vec<&str> = lines
        .iter()
        .filter(|v| v["type"] == "StatusChanged")
        .filter_map(|v| v["status"].as_str())
        .collect();
    assert_eq!(statuses, vec!["idle", "held", "idle"]);

    let snapshots: Vec<&serde_json::Value> =
        lines.iter().filter(|v| v.get("lock").is_some()).collect();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0]["lock"], "held");
    assert_eq!(snapshots[1]["lock"], "idle");
}

#[test]
fn test_run_unsupported_platform() {
    let (stdout, _, code) = run_cli_with_input(
        &["run", "--unsupported", "--output", "json"],
        "on\nstatus\nquit\n",
    );
    assert_eq!(code, 0, "run failed");
    assert_contains(&stdout, "\"not_supported\"");
    assert_contains(&stdout, "\"control_enabled\":false");
}

#[test]
fn test_run_text_output() {
    let (stdout, _, code) = run_cli_with_input(
        &["run", "--mode", "immediate", "--output", "text"],
        "quit\n",
    );
    assert_eq!(code, 0, "run failed");
    assert_contains(&stdout, "screen lock: supported");
    assert_contains(&stdout, "status: active");
}
