//! Integration tests for `procdump config` command.
//!
//! All filesystem-touching tests set `PROCDUMP_CONFIG` to a temp path so they
//! never read or write `~/.procdump/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn procdump() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("procdump"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    procdump()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

#[test]
fn test_config_show_without_file_prints_defaults() {
    let (_dir, path) = temp_config_path();
    procdump()
        .args(["config", "show"])
        .env("PROCDUMP_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("poll.attempts:"))
        .stdout(predicate::str::contains("20"))
        .stdout(predicate::str::contains("log.txt"));
}

#[test]
fn test_config_show_json_reports_path_and_values() {
    let (_dir, path) = temp_config_path();
    let output = procdump()
        .args(["config", "show", "--json"])
        .env("PROCDUMP_CONFIG", &path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(v["path"], path.as_str());
    assert_eq!(v["config"]["poll"]["attempts"], 20);
    assert_eq!(v["config"]["script"]["invoke_path"], r"C:\run-dump.ps1");
}

#[test]
fn test_config_set_persists_value() {
    let (_dir, path) = temp_config_path();
    procdump()
        .args(["config", "set", "poll.attempts", "5"])
        .env("PROCDUMP_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set poll.attempts = 5"));

    let content = std::fs::read_to_string(&path).expect("config written");
    assert!(content.contains("attempts: 5"), "got: {content}");
}

#[test]
fn test_config_flag_overrides_env() {
    let (_dir, path) = temp_config_path();
    procdump()
        .args(["--config", &path, "config", "set", "kubectl.context", "aks-win"])
        .env("PROCDUMP_CONFIG", "/nonexistent/elsewhere.yaml")
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).expect("config written");
    assert!(content.contains("aks-win"), "got: {content}");
}

#[test]
fn test_config_set_unknown_key_fails() {
    let (_dir, path) = temp_config_path();
    procdump()
        .args(["config", "set", "security.level", "strict"])
        .env("PROCDUMP_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_value_fails() {
    let (_dir, path) = temp_config_path();
    procdump()
        .args(["config", "set", "poll.interval_secs", "0"])
        .env("PROCDUMP_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive integer"));
}
