//! Tests for the YAML installer-defaults store and the config service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use murmur_setup::application::ports::ConfigStore;
use murmur_setup::application::services::config_service;
use murmur_setup::domain::ConfigError;
use murmur_setup::domain::config::InstallerConfig;
use murmur_setup::infra::config::YamlConfigStore;
use proptest::prelude::*;
use tempfile::TempDir;

fn store() -> (TempDir, YamlConfigStore) {
    let dir = TempDir::new().unwrap();
    let store = YamlConfigStore::at(dir.path().join("nested").join("config.yaml"));
    (dir, store)
}

#[test]
fn missing_file_loads_defaults() {
    let (_dir, store) = store();
    assert_eq!(store.load().unwrap(), InstallerConfig::default());
    assert!(!store.path().unwrap().exists());
}

#[test]
fn set_value_persists_and_reloads() {
    let (_dir, store) = store();
    config_service::set_value(&store, "defaults.port", "4000").unwrap();
    config_service::set_value(&store, "native.ini_file", "/srv/murmur.ini").unwrap();

    let config = store.load().unwrap();
    assert_eq!(config.defaults.port, 4000);
    assert_eq!(config.native.ini_file.to_string_lossy(), "/srv/murmur.ini");
    assert_eq!(config.defaults.server_name, "Mumble Server");
}

#[cfg(unix)]
#[test]
fn saved_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, store) = store();
    config_service::save_config(&store, &InstallerConfig::default()).unwrap();
    let mode = std::fs::metadata(store.path().unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn rejected_value_writes_nothing() {
    let (_dir, store) = store();
    let err = config_service::set_value(&store, "defaults.max_users", "0").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidValue { .. })
    ));
    assert!(!store.path().unwrap().exists());
}

#[test]
fn partial_file_fills_in_defaults() {
    let (_dir, store) = store();
    let path = store.path().unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "docker:\n  service: voice\n").unwrap();

    let config = store.load().unwrap();
    assert_eq!(config.docker.service, "voice");
    assert_eq!(config.defaults.port, 64738);
}

proptest! {
    #[test]
    fn any_valid_port_round_trips(port in 1u16..=u16::MAX) {
        let (_dir, store) = store();
        config_service::set_value(&store, "defaults.port", &port.to_string()).unwrap();
        prop_assert_eq!(store.load().unwrap().defaults.port, port);
    }

    #[test]
    fn unknown_keys_never_reach_disk(key in "[a-z]{1,8}\\.[a-z_]{1,12}") {
        prop_assume!(!murmur_setup::domain::config::VALID_CONFIG_KEYS.contains(&key.as_str()));
        let (_dir, store) = store();
        prop_assert!(config_service::set_value(&store, &key, "x").is_err());
        prop_assert!(!store.path().unwrap().exists());
    }
}
