//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated `POMOLOG_HOME` and
//! verify outputs and the files it leaves behind.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomolog"))
        .args(args)
        .env("POMOLOG_HOME", home)
        .env_remove("POMOLOG_ACTIVE_NOTE")
        .env_remove("POMOLOG_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

#[test]
fn test_config_path_is_inside_home() {
    let home = tempfile::tempdir().unwrap();
    let out = run_ok(home.path(), &["config", "path"]);
    assert_eq!(out.trim(), home.path().join("config.toml").display().to_string());
}

#[test]
fn test_config_set_and_get() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "durations.pomo_minutes", "30"]);
    let out = run_ok(home.path(), &["config", "get", "durations.pomo_minutes"]);
    assert_eq!(out.trim(), "30.0");

    run_ok(home.path(), &["config", "set", "logging.destination", "fixed_file"]);
    let out = run_ok(home.path(), &["config", "get", "logging.destination"]);
    assert_eq!(out.trim(), "fixed_file");
}

#[test]
fn test_config_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "durations.nap", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_status_when_idle() {
    let home = tempfile::tempdir().unwrap();
    let out = run_ok(home.path(), &["timer", "status"]);
    assert_eq!(out.trim(), "🍅");
}

#[test]
fn test_start_pause_quit_cycle() {
    let home = tempfile::tempdir().unwrap();

    let out = run_ok(home.path(), &["timer", "start", "pomo"]);
    assert!(out.starts_with("🍅 2"), "unexpected status: {out}");
    let log = std::fs::read_to_string(home.path().join("Pomodoro.md")).unwrap();
    assert!(log.starts_with("## Pomodoro "));
    assert!(log.contains("[🍅 Start] "));

    run_ok(home.path(), &["timer", "pause"]);
    let json = run_ok(home.path(), &["timer", "status", "--json"]);
    let snapshot: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot["phase"], "paused");
    assert_eq!(snapshot["mode"], "pomo");

    let out = run_ok(home.path(), &["timer", "quit"]);
    assert_eq!(out.trim(), "timer stopped");
    assert_eq!(run_ok(home.path(), &["timer", "status"]).trim(), "🍅");

    let log = std::fs::read_to_string(home.path().join("Pomodoro.md")).unwrap();
    assert!(log.contains("[🍅 Quit Early] "));

    let today = run_ok(home.path(), &["log", "today"]);
    assert!(today.starts_with("🍅 00:0"), "unexpected totals: {today}");
}

#[test]
fn test_start_confirmation_declined_on_eof() {
    let home = tempfile::tempdir().unwrap();
    run_ok(home.path(), &["config", "set", "flow.confirm_on_session_start", "true"]);

    let out = run_ok(home.path(), &["timer", "start"]);
    assert_eq!(out.trim(), "start cancelled");
    assert!(!home.path().join("Pomodoro.md").exists());

    let out = run_ok(home.path(), &["timer", "start", "--yes"]);
    assert!(out.starts_with("🍅 "));
}

#[test]
fn test_finish_without_session() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["timer", "finish"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("No active session to finish."));
}

#[test]
fn test_custom_session_logs_to_its_note() {
    let home = tempfile::tempdir().unwrap();
    let out = run_ok(
        home.path(),
        &["timer", "custom", "--pomo", "40", "--break", "8", "--log-note", "Deep work.md"],
    );
    assert!(out.starts_with("🍅 39:") || out.starts_with("🍅 40:"), "unexpected status: {out}");
    assert!(home.path().join("Deep work.md").exists());

    let json = run_ok(home.path(), &["timer", "status", "--json"]);
    let snapshot: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot["custom"], true);
    assert_eq!(snapshot["nominal_ms"], 40 * 60_000);
}

#[test]
fn test_log_refresh_without_entries() {
    let home = tempfile::tempdir().unwrap();
    let out = run_ok(home.path(), &["log", "refresh"]);
    assert!(out.starts_with("nothing logged today"));
}

#[test]
fn test_out_of_range_lengths_are_errors() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["timer", "custom", "--pomo", "1e12"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Invalid session length"), "stderr: {stderr}");
    assert_eq!(run_ok(home.path(), &["timer", "status"]).trim(), "🍅");

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "durations.pomo_minutes", "-5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("durations.pomo_minutes"));
    let out = run_ok(home.path(), &["config", "get", "durations.pomo_minutes"]);
    assert_eq!(out.trim(), "25.0");
}
