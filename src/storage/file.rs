//! File-backed state store.
//!
//! One small JSON document per key, named `<prefix><key>.state` inside the
//! configured directory.

use super::backend::{PersistedSample, SampleKey, StateStore};
use crate::core::config::StateConfig;
use crate::core::{ProbeError, Result};
use std::path::{Path, PathBuf};

/// State store keeping one file per sample key.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
    prefix: String,
}

impl FileStateStore {
    /// Create a store rooted at `dir`.
    pub fn new<P: AsRef<Path>>(dir: P, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
        }
    }

    /// Create a store from the state section of the configuration.
    pub fn from_config(config: &StateConfig) -> Self {
        Self::new(&config.dir, config.file_prefix.clone())
    }

    /// Path of the record for `key`.
    pub fn path_for(&self, key: &SampleKey) -> PathBuf {
        self.dir.join(format!("{}{}.state", self.prefix, key))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, key: &SampleKey) -> Option<PersistedSample> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No previous sample");
                return None;
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable state file, starting a new baseline");
                return None;
            },
        };

        match serde_json::from_slice::<PersistedSample>(&bytes) {
            Ok(sample) if sample.time.is_finite() && sample.value.is_finite() => Some(sample),
            Ok(sample) => {
                tracing::warn!(path = %path.display(), ?sample, "Non-finite sample in state file, starting a new baseline");
                None
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt state file, starting a new baseline");
                None
            },
        }
    }

    fn store(&mut self, key: &SampleKey, sample: PersistedSample) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ProbeError::storage(format!(
                "Failed to create state directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.path_for(key);
        let data = serde_json::to_vec(&sample)?;

        // Write beside the record and rename over it so a reader never sees
        // a partial document.
        let staging = path.with_extension(format!("state.{}.tmp", std::process::id()));
        std::fs::write(&staging, &data).map_err(|e| {
            ProbeError::storage(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        if let Err(e) = std::fs::rename(&staging, &path) {
            let _ = std::fs::remove_file(&staging);
            return Err(ProbeError::storage(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            )));
        }

        tracing::debug!(path = %path.display(), time = sample.time, value = sample.value, "Stored sample");
        Ok(())
    }
}
