//! Storage layer for auditlog
//!
//! Provides JSON file storage with atomic writes for the schema and the
//! property store, and an append-only JSONL file for audit records.

pub mod audit_log;
pub mod file_io;
pub mod init;
pub mod properties;
pub mod schema;

pub use audit_log::AuditLogRepository;
pub use file_io::{append_json_lines, read_json, read_json_lines, write_json_atomic};
pub use init::initialize_storage;
pub use properties::PropertyStore;

use std::sync::Arc;

use crate::config::paths::AuditPaths;
use crate::error::AuditError;
use crate::schema::TypeRegistry;

/// Main storage coordinator that opens every file-backed collaborator
pub struct Storage {
    paths: AuditPaths,
    pub registry: Arc<TypeRegistry>,
    pub properties: Arc<PropertyStore>,
    pub audit_log: Arc<AuditLogRepository>,
}

impl Storage {
    /// Open all stores under the given paths
    pub fn open(paths: AuditPaths) -> Result<Self, AuditError> {
        paths.ensure_directories()?;

        Ok(Self {
            registry: Arc::new(schema::load_registry(paths.schema_file())?),
            properties: Arc::new(PropertyStore::open(paths.properties_file())?),
            audit_log: Arc::new(AuditLogRepository::open(paths.audit_log())?),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &AuditPaths {
        &self.paths
    }

    /// Write the registry back to `schema.json`
    pub fn save_schema(&self) -> Result<(), AuditError> {
        schema::save_registry(self.paths.schema_file(), &self.registry)
    }

    /// Check if storage has been initialized (has a schema)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}
