//! Scoped backup of an artifact taken before it is mutated.
//!
//! An [`ArtifactBackup`] is armed on creation. [`commit`](ArtifactBackup::commit)
//! disarms it and keeps the copy on disk; [`rollback`](ArtifactBackup::rollback)
//! writes the copy back over the artifact. Dropping an armed guard rolls back,
//! so every early return, `?` and unwind restores the original.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::artifact;
use crate::error::ArtifactError;

/// How the backup sibling is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupNaming {
    /// `<file>.bak`, overwritten on every run.
    Fixed,
    /// `<file>.bak.<YYYYmmdd-HHMMSS>`, one per run.
    Timestamped,
}

impl BackupNaming {
    /// Backup path for `artifact` under this scheme.
    #[must_use]
    pub fn path_for(self, artifact: &Path) -> PathBuf {
        let mut name = artifact
            .file_name()
            .map_or_else(|| OsString::from("artifact"), OsString::from);
        match self {
            Self::Fixed => name.push(".bak"),
            Self::Timestamped => {
                name.push(format!(".bak.{}", Local::now().format("%Y%m%d-%H%M%S")));
            }
        }
        let candidate = artifact.with_file_name(&name);
        if self == Self::Fixed || !candidate.exists() {
            return candidate;
        }
        (1..)
            .map(|n| {
                let mut numbered = name.clone();
                numbered.push(format!("-{n}"));
                artifact.with_file_name(numbered)
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

/// Restore `artifact` from `backup`, leaving `backup` in place.
pub fn restore(backup: &Path, artifact: &Path) -> Result<(), ArtifactError> {
    let bytes = match std::fs::read(backup) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::Missing(backup.to_path_buf()));
        }
        Err(e) => return Err(ArtifactError::io(backup, e)),
    };
    artifact::write_atomic(artifact, &bytes)
}

/// Guard over a byte-identical copy of an artifact.
#[derive(Debug)]
#[must_use = "dropping the guard restores the artifact"]
pub struct ArtifactBackup {
    artifact: PathBuf,
    backup: PathBuf,
    armed: bool,
}

impl ArtifactBackup {
    /// Copy `artifact` to its backup path and arm the guard.
    pub fn create(artifact: &Path, naming: BackupNaming) -> Result<Self, ArtifactError> {
        if !artifact.exists() {
            return Err(ArtifactError::Missing(artifact.to_path_buf()));
        }
        let backup = naming.path_for(artifact);
        std::fs::copy(artifact, &backup).map_err(|e| ArtifactError::io(&backup, e))?;
        Ok(Self {
            artifact: artifact.to_path_buf(),
            backup,
            armed: true,
        })
    }

    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.backup
    }

    /// Accept the mutated artifact. The backup file stays as a recovery aid.
    pub fn commit(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.backup)
    }

    /// Put the original back.
    pub fn rollback(mut self) -> Result<PathBuf, ArtifactError> {
        self.armed = false;
        restore(&self.backup, &self.artifact)?;
        Ok(std::mem::take(&mut self.backup))
    }
}

impl Drop for ArtifactBackup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match restore(&self.backup, &self.artifact) {
            Ok(()) => tracing::warn!(
                artifact = %self.artifact.display(),
                backup = %self.backup.display(),
                "restored artifact from backup"
            ),
            Err(e) => tracing::error!(
                artifact = %self.artifact.display(),
                backup = %self.backup.display(),
                error = %e,
                "could not restore artifact from backup"
            ),
        }
    }
}
