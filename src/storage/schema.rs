//! Type registry persistence
//!
//! `schema.json` holds the descriptors of every mapped type.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::schema::{TypeDescriptor, TypeRegistry};

use super::file_io::{read_json, write_json_atomic};

/// Serializable schema data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaData {
    pub types: Vec<TypeDescriptor>,
}

/// Load the registry from disk; a missing file yields an empty registry
pub fn load_registry(path: impl AsRef<Path>) -> Result<TypeRegistry, AuditError> {
    let data: SchemaData = read_json(path)?;
    Ok(TypeRegistry::from_descriptors(data.types))
}

/// Save every registered descriptor, sorted by name
pub fn save_registry(path: impl AsRef<Path>, registry: &TypeRegistry) -> Result<(), AuditError> {
    let data = SchemaData {
        types: registry.descriptors(),
    };
    write_json_atomic(path, &data)
}
