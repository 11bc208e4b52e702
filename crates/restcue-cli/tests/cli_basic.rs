//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway config file.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "restcue-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn config_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_config_reset_then_get() {
    let dir = TempDir::new().unwrap();
    let path = config_arg(&dir.path().join("config.toml"));

    let (code, _, _) = run_cli(&["config", "reset", "--config", &path]);
    assert_eq!(code, 0, "config reset failed");

    let (code, stdout, _) = run_cli(&["config", "get", "pomodoro.work_minutes", "--config", &path]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_set_persists() {
    let dir = TempDir::new().unwrap();
    let path = config_arg(&dir.path().join("config.toml"));

    let (code, _, _) = run_cli(&["config", "set", "water.interval_minutes", "45", "--config", &path]);
    assert_eq!(code, 0, "config set failed");

    let (code, stdout, _) = run_cli(&["config", "list", "--config", &path]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["water"]["interval_minutes"], 45);
    assert_eq!(parsed["water"]["enabled"], true);
}

#[test]
fn test_config_set_rejects_zero_duration() {
    let dir = TempDir::new().unwrap();
    let path = config_arg(&dir.path().join("config.toml"));

    let (code, _, stderr) = run_cli(&["config", "set", "pomodoro.break_minutes", "0", "--config", &path]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_get_unknown_key() {
    let dir = TempDir::new().unwrap();
    let path = config_arg(&dir.path().join("config.toml"));

    let (code, _, stderr) = run_cli(&["config", "get", "nope", "--config", &path]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}
