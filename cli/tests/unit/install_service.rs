//! Tests for the docker and native install pipelines: ordering, rollback on
//! every failing step, commit on success and the SuperUser secret outcomes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use murmur_config::{ArtifactError, compose};
use murmur_setup::application::services::install::{
    self, DockerOptions, NativeOptions, SecretWait,
};
use murmur_setup::domain::{FirewallOutcome, Mode, SetupError, SuperUserStatus};
use tempfile::TempDir;

use crate::helpers::{COMPOSE, INI, SECRET_LOG, collected};
use crate::mocks::{
    FakeDriver, FakeExposer, FakeProvisioner, RecordingReporter, entries, journal,
};

const QUICK: SecretWait = SecretWait {
    attempts: 2,
    interval: Duration::ZERO,
};

fn artifact(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn docker_opts<'a>(reporter: &'a RecordingReporter, path: &'a Path) -> DockerOptions<'a, RecordingReporter> {
    DockerOptions {
        reporter,
        compose_file: path,
        service: compose::SERVICE,
        generate: false,
        secret_wait: QUICK,
    }
}

fn native_opts<'a>(reporter: &'a RecordingReporter, path: &'a Path) -> NativeOptions<'a, RecordingReporter> {
    NativeOptions {
        reporter,
        ini_file: path,
        package: "mumble-server",
        service: "mumble-server",
        secret_wait: QUICK,
    }
}

fn backups_in(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().contains(".bak"))
        .collect()
}

// ── docker ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn docker_success_rewrites_and_keeps_backup() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();

    let summary = install::install_docker(
        &docker_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, SECRET_LOG),
    )
    .await
    .unwrap();

    assert_eq!(entries(&log), ["runtime", "open 12345", "restart", "logs"]);
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"12345:12345/udp\""));
    assert!(written.contains("MUMBLE_CONFIG_host=0.0.0.0"));
    assert!(!written.contains("MUMBLE_SUPERUSER_PASSWORD"));

    let backup = summary.backup.clone().unwrap();
    assert_eq!(backup, dir.path().join("docker-compose.yml.bak"));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), COMPOSE);

    assert!(summary.changed);
    assert_eq!(summary.port, 12345);
    assert!(matches!(summary.firewall, FirewallOutcome::Opened { .. }));
    assert_eq!(
        summary.superuser,
        SuperUserStatus::Extracted {
            password: "x7Yq2pLm".to_string()
        }
    );
}

#[tokio::test]
async fn docker_runtime_failure_restores_compose_file() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();
    let provisioner = FakeProvisioner {
        fail_runtime: true,
        ..FakeProvisioner::ok(&log)
    };

    let err = install::install_docker(
        &docker_opts(&reporter, &path),
        &collected(""),
        &provisioner,
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, ""),
    )
    .await
    .unwrap_err();

    assert!(format!("{err:#}").contains("Docker daemon"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), COMPOSE);
    assert_eq!(entries(&log), ["runtime"]);
    assert!(reporter.warnings().iter().any(|w| w.starts_with("Restored")));
}

#[tokio::test]
async fn docker_firewall_failure_restores_compose_file() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();
    let exposer = FakeExposer {
        fail: true,
        ..FakeExposer::ok(&log)
    };

    install::install_docker(
        &docker_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &exposer,
        &FakeDriver::running(&log, ""),
    )
    .await
    .unwrap_err();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), COMPOSE);
    assert!(!entries(&log).contains(&"restart".to_string()));
}

#[tokio::test]
async fn docker_inactive_service_restores_and_names_inspect_command() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();
    let driver = FakeDriver {
        active: false,
        ..FakeDriver::running(&log, "")
    };

    let err = install::install_docker(
        &docker_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &driver,
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<SetupError>() {
        Some(SetupError::ServiceNotActive { hint, .. }) => assert_eq!(hint, "journalctl -u fake"),
        other => panic!("expected ServiceNotActive, got {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), COMPOSE);
}

#[tokio::test]
async fn docker_missing_compose_file_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");
    let log = journal();
    let reporter = RecordingReporter::default();

    let err = install::install_docker(
        &docker_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, ""),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ArtifactError>(),
        Some(ArtifactError::Missing(_))
    ));
    assert!(entries(&log).is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn docker_generate_writes_template_first() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mumble").join("docker-compose.yml");
    let log = journal();
    let reporter = RecordingReporter::default();
    let opts = DockerOptions {
        generate: true,
        ..docker_opts(&reporter, &path)
    };

    let summary = install::install_docker(
        &opts,
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, SECRET_LOG),
    )
    .await
    .unwrap();

    let backup = summary.backup.unwrap();
    assert_eq!(std::fs::read_to_string(backup).unwrap(), compose::TEMPLATE);
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("MUMBLE_CONFIG_port=12345"));
    assert!(written.contains("image: mumblevoip/mumble-server:latest"));
}

#[tokio::test]
async fn docker_failed_run_removes_generated_template_and_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");
    let log = journal();
    let reporter = RecordingReporter::default();
    let opts = DockerOptions {
        generate: true,
        ..docker_opts(&reporter, &path)
    };
    let provisioner = FakeProvisioner {
        fail_runtime: true,
        ..FakeProvisioner::ok(&log)
    };

    install::install_docker(
        &opts,
        &collected(""),
        &provisioner,
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, ""),
    )
    .await
    .unwrap_err();

    assert!(!path.exists());
    assert!(backups_in(&dir).is_empty());
    assert!(
        reporter
            .warnings()
            .iter()
            .any(|w| w.starts_with("Removing generated"))
    );
}

#[tokio::test]
async fn docker_interrupted_run_removes_generated_template() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");
    let log = journal();
    let reporter = RecordingReporter::default();
    let driver = FakeDriver {
        hang_on_restart: true,
        ..FakeDriver::running(&log, "")
    };
    let opts = DockerOptions {
        generate: true,
        ..docker_opts(&reporter, &path)
    };
    let set = collected("");
    let provisioner = FakeProvisioner::ok(&log);
    let exposer = FakeExposer::ok(&log);

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        install::install_docker(&opts, &set, &provisioner, &exposer, &driver),
    )
    .await;

    assert!(outcome.is_err());
    assert!(!path.exists());
    assert!(backups_in(&dir).is_empty());
}

#[tokio::test]
async fn docker_existing_file_survives_failure_with_generate() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();
    let opts = DockerOptions {
        generate: true,
        ..docker_opts(&reporter, &path)
    };
    let exposer = FakeExposer {
        fail: true,
        ..FakeExposer::ok(&log)
    };

    install::install_docker(
        &opts,
        &collected(""),
        &FakeProvisioner::ok(&log),
        &exposer,
        &FakeDriver::running(&log, ""),
    )
    .await
    .unwrap_err();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), COMPOSE);
    assert_eq!(backups_in(&dir).len(), 1);
}

#[tokio::test]
async fn docker_secret_timeout_degrades_to_fallback_hint() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();

    let summary = install::install_docker(
        &docker_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, "Server listening on 0.0.0.0:12345\n"),
    )
    .await
    .unwrap();

    let polls = entries(&log).iter().filter(|e| *e == "logs").count();
    assert_eq!(polls, 2);
    match summary.superuser {
        SuperUserStatus::Unconfirmed { fallback } => {
            assert!(fallback.contains("-supw"));
            assert!(fallback.contains(&path.display().to_string()));
        }
        other => panic!("expected Unconfirmed, got {other:?}"),
    }
}

#[tokio::test]
async fn dropping_the_pipeline_mid_run_restores_the_file() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "docker-compose.yml", COMPOSE);
    let log = journal();
    let reporter = RecordingReporter::default();
    let driver = FakeDriver {
        hang_on_restart: true,
        ..FakeDriver::running(&log, "")
    };
    let opts = docker_opts(&reporter, &path);
    let set = collected("");
    let provisioner = FakeProvisioner::ok(&log);
    let exposer = FakeExposer::ok(&log);

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        install::install_docker(&opts, &set, &provisioner, &exposer, &driver),
    )
    .await;

    assert!(outcome.is_err(), "pipeline should still be waiting on restart");
    assert_eq!(entries(&log).last().unwrap(), "restart");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), COMPOSE);
}

// ── native ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn native_installs_package_before_touching_ini() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "mumble-server.ini", INI);
    let log = journal();
    let reporter = RecordingReporter::default();
    let driver = FakeDriver::running(&log, "");

    let summary = install::install_native(
        &native_opts(&reporter, &path),
        &collected("admin-pw"),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &driver,
    )
    .await
    .unwrap();

    assert_eq!(
        entries(&log),
        ["install mumble-server", "open 12345", "supw admin-pw", "restart"]
    );
    assert_eq!(summary.superuser, SuperUserStatus::Supplied);
    assert_eq!(summary.mode, Mode::Native);

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("port=12345\n"));
    assert!(written.contains("users=25\n"));
    assert!(written.contains("host=0.0.0.0\n"));
    assert!(written.ends_with("[Ice]\nIce.Warn.UnknownProperties=1\n"));

    let backups = backups_in(&dir);
    assert_eq!(backups.len(), 1);
    assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), INI);
}

#[tokio::test]
async fn native_package_failure_leaves_no_backup() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "mumble-server.ini", INI);
    let log = journal();
    let reporter = RecordingReporter::default();
    let provisioner = FakeProvisioner {
        fail_install: true,
        ..FakeProvisioner::ok(&log)
    };

    let err = install::install_native(
        &native_opts(&reporter, &path),
        &collected(""),
        &provisioner,
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, ""),
    )
    .await
    .unwrap_err();

    assert!(format!("{err:#}").contains("installing mumble-server"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), INI);
    assert!(backups_in(&dir).is_empty());
}

#[tokio::test]
async fn native_without_password_scrapes_generated_one() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "mumble-server.ini", INI);
    let log = journal();
    let reporter = RecordingReporter::default();

    let summary = install::install_native(
        &native_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &FakeDriver::running(&log, SECRET_LOG),
    )
    .await
    .unwrap();

    assert!(!entries(&log).iter().any(|e| e.starts_with("supw")));
    assert_eq!(
        summary.superuser,
        SuperUserStatus::Extracted {
            password: "x7Yq2pLm".to_string()
        }
    );
}

#[tokio::test]
async fn native_inactive_unit_restores_ini() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "mumble-server.ini", INI);
    let log = journal();
    let reporter = RecordingReporter::default();
    let driver = FakeDriver {
        active: false,
        ..FakeDriver::running(&log, "")
    };

    install::install_native(
        &native_opts(&reporter, &path),
        &collected(""),
        &FakeProvisioner::ok(&log),
        &FakeExposer::ok(&log),
        &driver,
    )
    .await
    .unwrap_err();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), INI);
    assert_eq!(backups_in(&dir).len(), 1, "the backup stays for a manual restore");
}

// ── preview ──────────────────────────────────────────────────────────────────

#[test]
fn preview_leaves_the_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = artifact(&dir, "mumble-server.ini", INI);

    let content = install::preview(Mode::Native, &path, false, &collected("")).unwrap();

    assert!(content.contains("port=12345\n"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), INI);
    assert!(backups_in(&dir).is_empty());
}

#[test]
fn preview_with_generate_uses_template_when_file_is_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docker-compose.yml");

    let content = install::preview(Mode::Docker, &path, true, &collected("")).unwrap();

    assert!(content.contains("\"12345:12345\""));
    assert!(!path.exists());
}
