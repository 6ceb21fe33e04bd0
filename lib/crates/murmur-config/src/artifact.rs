//! Reading and atomically replacing configuration artifacts on disk.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ArtifactError;
use crate::field::ConfigurationSet;
use crate::rules::RuleTable;

/// Read an artifact, distinguishing "missing" from other I/O failures.
pub fn read(path: &Path) -> Result<String, ArtifactError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ArtifactError::Missing(path.to_path_buf()))
        }
        Err(e) => Err(ArtifactError::io(path, e)),
    }
}

/// Replace `path` with `contents` via a sibling temporary file and a rename.
///
/// Readers of `path` see either the old or the new contents, never a mix.
/// When `path` already exists its permissions and ownership are carried over.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ArtifactError> {
    let dir = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| ArtifactError::TempFile {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ArtifactError::io(tmp.path(), e))?;

    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| ArtifactError::io(tmp.path(), e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            std::os::unix::fs::fchown(tmp.as_file(), Some(meta.uid()), Some(meta.gid()))
                .map_err(|e| ArtifactError::io(tmp.path(), e))?;
        }
    }

    tmp.persist(path).map_err(|e| ArtifactError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Transform the artifact at `path` in memory without touching the file.
pub fn render(path: &Path, table: &RuleTable, set: &ConfigurationSet) -> Result<String, ArtifactError> {
    let content = read(path)?;
    table.transform(&content, set)
}

/// Transform the artifact at `path` and atomically replace it.
///
/// Returns `false` when the result equals the current contents, in which case
/// the file is left untouched.
pub fn apply_to_file(path: &Path, table: &RuleTable, set: &ConfigurationSet) -> Result<bool, ArtifactError> {
    set.ensure_complete()?;
    let content = read(path)?;
    let updated = table.transform(&content, set)?;
    if updated == content {
        return Ok(false);
    }
    write_atomic(path, updated.as_bytes())?;
    Ok(true)
}
