//! Integration tests for `murmur-setup restore`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn murmur_setup() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("murmur-setup"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn restore_copies_backup_byte_for_byte() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mumble-server.ini");
    let backup = dir.path().join("mumble-server.ini.bak.20261019-091244");
    std::fs::write(&file, "port=4000\n").unwrap();
    std::fs::write(&backup, "port=64738\r\n; kept\r\n").unwrap();

    murmur_setup()
        .args(["restore", "-y", "--file"])
        .arg(&file)
        .arg("--backup")
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));

    assert_eq!(std::fs::read(&file).unwrap(), b"port=64738\r\n; kept\r\n");
    assert!(backup.exists(), "the backup is kept");
}

#[test]
fn restore_from_missing_backup_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mumble-server.ini");
    std::fs::write(&file, "port=4000\n").unwrap();

    murmur_setup()
        .args(["restore", "-y", "--file"])
        .arg(&file)
        .arg("--backup")
        .arg(dir.path().join("nope.bak"))
        .assert()
        .code(1);

    assert_eq!(std::fs::read_to_string(&file).unwrap(), "port=4000\n");
}

#[test]
fn restore_json_reports_paths() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("docker-compose.yml");
    let backup = dir.path().join("docker-compose.yml.bak");
    std::fs::write(&backup, "services: {}\n").unwrap();

    let output = murmur_setup()
        .args(["--json", "restore", "-y", "--file"])
        .arg(&file)
        .arg("--backup")
        .arg(&backup)
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["restored"], file.to_string_lossy().as_ref());
}
