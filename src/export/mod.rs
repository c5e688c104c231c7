//! Export module for auditlog
//!
//! Exports audit records in multiple formats:
//! - CSV: one row per changed property (spreadsheet-compatible)
//! - JSON: records plus the policy in effect, machine-readable
//! - YAML: the same document, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::export_records_csv;
pub use json::{export_json, import_from_json, AuditExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_yaml, import_from_yaml};
