//! Live configuration store with hot reload support.
//!
//! The current configuration is an immutable [`ServiceConfig`] published
//! through an [`ArcSwap`]. Readers take a snapshot and never observe a
//! partially applied document; `load_from_file` and `reload` build the next
//! snapshot off to the side and swap it in only after the whole document
//! parsed.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use arc_swap::ArcSwap;

use crate::config::loader::{read_document, ConfigError};
use crate::config::schema::ServiceConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Default)]
struct FileState {
    path: Option<PathBuf>,
    last_modified: Option<SystemTime>,
}

/// Holds the active configuration and the file it came from.
#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<ServiceConfig>,
    // Also serializes concurrent loads.
    file: Mutex<FileState>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create a store holding the built-in defaults.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ServiceConfig::default()),
            file: Mutex::new(FileState::default()),
        }
    }

    fn file_state(&self) -> MutexGuard<'_, FileState> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current configuration snapshot.
    pub fn snapshot(&self) -> Arc<ServiceConfig> {
        self.current.load_full()
    }

    /// Replace the current configuration with the built-in defaults.
    pub fn load_defaults(&self) {
        self.current.store(Arc::new(ServiceConfig::default()));
    }

    /// Load `path` and overlay it onto the current configuration.
    ///
    /// The path is remembered even if loading fails, so a later `reload`
    /// retries the same file. On failure the published snapshot and the
    /// modification time are left untouched.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let mut state = self.file_state();
        state.path = Some(path.to_path_buf());
        self.load_locked(&mut state, path)
    }

    fn load_locked(&self, state: &mut FileState, path: &Path) -> Result<(), ConfigError> {
        let document = read_document(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to load config file");
            e
        })?;

        let next = document.apply(&self.current.load());
        self.current.store(Arc::new(next));
        state.last_modified = modified_time(path);

        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(())
    }

    /// Re-read the file given to the last `load_from_file`.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let mut state = self.file_state();
        let path = state.path.clone().ok_or(ConfigError::NoPath)?;
        self.load_locked(&mut state, &path)
    }

    /// Whether the backing file changed since the last successful load.
    ///
    /// False when no path is set or the file does not exist.
    pub fn is_config_modified(&self) -> bool {
        let state = self.file_state();
        let Some(path) = state.path.as_deref() else {
            return false;
        };

        match modified_time(path) {
            Some(current) => state.last_modified != Some(current),
            None => false,
        }
    }

    /// Path remembered by the last `load_from_file`.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.file_state().path.clone()
    }

    /// Validate the current snapshot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_config(&self.current.load()).map_err(ConfigError::Validation)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
