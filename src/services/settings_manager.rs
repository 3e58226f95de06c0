// SettingsManager Service
// Handles settings persistence to a flat JSON file

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::models::Settings;

pub const DEFAULT_SETTINGS_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Invalid(String),

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// Reads and writes the settings file
///
/// There is no in-memory cache: the settings HTTP endpoint writes the same file
/// behind our back, so every load goes to disk. Writes go through a temp file in
/// the same directory and a rename, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings, defaulting every field that is missing or unusable
    pub fn load(&self) -> Result<Settings, SettingsError> {
        match self.read_raw()? {
            Value::Object(map) => Ok(Settings::from_map(&map)),
            _ => Err(SettingsError::Invalid("expected a JSON object".to_string())),
        }
    }

    /// Load settings, falling back to defaults on any error
    ///
    /// The error is handed back so callers can tell a missing file apart from
    /// one that could not be read.
    pub fn load_or_default(&self) -> (Settings, Option<SettingsError>) {
        match self.load() {
            Ok(settings) => (settings, None),
            Err(e) => {
                match &e {
                    SettingsError::NotFound(path) => {
                        log::info!("No settings file at {}, using defaults", path.display())
                    }
                    other => log::warn!("Failed to load settings, using defaults: {other}"),
                }
                (Settings::default(), Some(e))
            }
        }
    }

    /// Overwrite the file with the whole record
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let value = serde_json::to_value(settings)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        self.write_raw(&value)?;
        log::info!("Settings saved to {}", self.settings_path.display());
        Ok(())
    }

    /// File contents as JSON, without any interpretation
    pub fn read_raw(&self) -> Result<Value, SettingsError> {
        let content = std::fs::read_to_string(&self.settings_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SettingsError::NotFound(self.settings_path.clone())
            } else {
                SettingsError::Io(e)
            }
        })?;

        serde_json::from_str(&content).map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    /// Replace the file with `value`, pretty-printed
    pub fn write_raw(&self, value: &Value) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;

        let dir = match self.settings_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        file.persist(&self.settings_path).map_err(|e| SettingsError::Io(e.error))?;
        Ok(())
    }
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_FILE)
    }
}
