//! Integration tests for `murmur-setup config`.
//!
//! Every test points `MURMUR_SETUP_CONFIG` at a temp path so nothing reads
//! or writes the real home directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn murmur_setup(config: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("murmur-setup"));
    cmd.env("NO_COLOR", "1").env("MURMUR_SETUP_CONFIG", config);
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
fn show_without_file_prints_defaults_and_creates_nothing() {
    let (_dir, path) = temp_config_path();
    murmur_setup(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults.port:"))
        .stdout(predicate::str::contains("64738"))
        .stdout(predicate::str::contains("MURMUR_SETUP_CONFIG"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn set_then_show_round_trips() {
    let (_dir, path) = temp_config_path();
    murmur_setup(&path)
        .args(["config", "set", "defaults.server_name", "Guild Voice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set defaults.server_name = Guild Voice"));

    murmur_setup(&path)
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""server_name": "Guild Voice""#));
}

#[test]
fn set_rejects_unknown_key() {
    let (_dir, path) = temp_config_path();
    murmur_setup(&path)
        .args(["config", "set", "security.level", "strict"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn set_rejects_bad_port_with_json_error() {
    let (_dir, path) = temp_config_path();
    let output = murmur_setup(&path)
        .args(["--json", "config", "set", "defaults.port", "70000"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "INVALID_CONFIG");
}

#[test]
fn path_prints_the_override() {
    let (_dir, path) = temp_config_path();
    murmur_setup(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path.as_str()));
}
