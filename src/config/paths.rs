//! Path management for auditlog
//!
//! ## Path Resolution Order
//!
//! 1. `AUDITLOG_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/auditlog` on Linux,
//!    `~/Library/Application Support/auditlog` on macOS, `%APPDATA%\auditlog`
//!    on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::AuditError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "AUDITLOG_DATA_DIR";

/// Manages all paths used by auditlog
#[derive(Debug, Clone)]
pub struct AuditPaths {
    /// Base directory for all auditlog data
    base_dir: PathBuf,
}

impl AuditPaths {
    /// Create a new AuditPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, AuditError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create AuditPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the type schema
    pub fn schema_file(&self) -> PathBuf {
        self.data_dir().join("schema.json")
    }

    /// Get the path to the key-value property store
    pub fn properties_file(&self) -> PathBuf {
        self.data_dir().join("properties.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.data_dir().join("audit.log")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), AuditError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuditError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| AuditError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if auditlog has been initialized (schema file exists)
    pub fn is_initialized(&self) -> bool {
        self.schema_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, AuditError> {
    ProjectDirs::from("", "", "auditlog")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| AuditError::Config("Could not determine a home directory".into()))
}
