//! Infrastructure implementation of the `ConfigStore` port.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::InstallerConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "MURMUR_SETUP_CONFIG";

/// Installer defaults kept in a YAML file under the home directory.
#[derive(Debug, Default)]
pub struct YamlConfigStore {
    path: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Store at the default location, or `MURMUR_SETUP_CONFIG` when set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store at a fixed `path`, ignoring the environment.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<InstallerConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(InstallerConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn save(&self, config: &InstallerConfig) -> Result<()> {
        let path = self.path()?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)
            .with_context(|| format!("cannot write to {}", parent.display()))?;
        tmp.write_all(content.as_bytes())
            .with_context(|| format!("cannot write {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", path.display()))?;
        }
        tmp.persist(&path)
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".murmur-setup").join("config.yaml"))
    }
}
