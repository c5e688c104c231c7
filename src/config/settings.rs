//! User settings for auditlog
//!
//! Persisted as `config.json` in the base directory. Every field has a
//! default so older files keep loading as fields are added.

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::error::AuditError;
use crate::logging::{LogFormat, LogLevel};

/// Properties never diffed by default: bookkeeping the host updates on every
/// write
pub const DEFAULT_IGNORED_PROPERTIES: &[&str] = &["dateChanged", "changedBy"];

/// Logging preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogSettings {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

/// User settings for auditlog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Creator identity stamped on records when the caller supplies none
    #[serde(default = "default_creator")]
    pub default_creator: String,

    /// Properties excluded from change capture
    #[serde(default = "default_ignored_properties")]
    pub ignored_properties: Vec<String>,

    #[serde(default)]
    pub log: LogSettings,

    /// Timestamp format for terminal output (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_creator() -> String {
    "system".to_string()
}

fn default_ignored_properties() -> Vec<String> {
    DEFAULT_IGNORED_PROPERTIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_creator: default_creator(),
            ignored_properties: default_ignored_properties(),
            log: LogSettings::default(),
            date_format: default_date_format(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| AuditError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AuditError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| AuditError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
