use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::CoreError;
use crate::models::preferences::UiPreferences;

use super::format;

/// Durable home of the UI preferences.
///
/// The store only commits a preference change after `save` succeeded,
/// so implementations may fail freely without corrupting in-memory state.
pub trait PreferenceStorage: Send + Sync {
    fn load(&self) -> Result<UiPreferences, CoreError>;

    fn save(&self, preferences: &UiPreferences) -> Result<(), CoreError>;
}

/// Preferences in a versioned JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStorage for JsonFileStorage {
    /// A missing file yields the defaults; a present but unreadable one is an error.
    fn load(&self) -> Result<UiPreferences, CoreError> {
        if !self.path.exists() {
            log::debug!(
                "No preferences file at {}, using defaults",
                self.path.display()
            );
            return Ok(UiPreferences::default());
        }
        let bytes = std::fs::read(&self.path)?;
        format::read_file(&bytes)
    }

    fn save(&self, preferences: &UiPreferences) -> Result<(), CoreError> {
        let bytes = format::write_file(preferences)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Write next to the target, then rename over it.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory storage for tests and hosts without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<UiPreferences>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously saved preferences.
    pub fn with_preferences(preferences: UiPreferences) -> Self {
        Self {
            saved: Mutex::new(Some(preferences)),
        }
    }

    /// Last saved value, if any save happened.
    pub fn saved(&self) -> Option<UiPreferences> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn load(&self) -> Result<UiPreferences, CoreError> {
        Ok(self.saved().unwrap_or_default())
    }

    fn save(&self, preferences: &UiPreferences) -> Result<(), CoreError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(preferences.clone());
        Ok(())
    }
}
