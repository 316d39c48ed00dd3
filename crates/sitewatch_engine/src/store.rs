//! Persisted per-target snapshot state.
//!
//! One plain-text record per target key under the state directory.
//! Records are replaced atomically (temp file + rename) so the prior
//! snapshot stays readable until the new one is fully committed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use sitewatch_core::{ContentSnapshot, MonitorTarget};

const SNAPSHOT_EXTENSION: &str = "snapshot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Key/value contract for the last-known snapshot per target.
///
/// Absence of an entry means "never observed", which is distinct from
/// "observed and unchanged".
pub trait StateStore: Send + Sync {
    fn load(&self, target: &MonitorTarget) -> Result<Option<ContentSnapshot>, StoreError>;
    fn save(&self, target: &MonitorTarget, snapshot: &ContentSnapshot) -> Result<(), StoreError>;
}

/// File-backed store: `{dir}/{sha256(url)}.snapshot`, one independent
/// record per target.
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn record_path(&self, target: &MonitorTarget) -> PathBuf {
        self.dir
            .join(format!("{}.{SNAPSHOT_EXTENSION}", target.key()))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, target: &MonitorTarget) -> Result<Option<ContentSnapshot>, StoreError> {
        let path = self.record_path(target);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err)),
        };
        Ok(Some(ContentSnapshot::from_plain(target.mode(), &content)))
    }

    fn save(&self, target: &MonitorTarget, snapshot: &ContentSnapshot) -> Result<(), StoreError> {
        ensure_state_dir(&self.dir)?;

        let path = self.record_path(target);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(snapshot.to_plain().as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Rename over the previous record in one step; the prior snapshot
        // stays readable until the new one is fully committed.
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

/// Ensure the state directory exists; create it if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    Ok(())
}
