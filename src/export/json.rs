//! JSON Export functionality
//!
//! Exports audit records together with the monitoring policy that was in
//! effect, with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{Action, AuditRecord};
use crate::error::{AuditError, AuditResult};
use crate::models::{MonitoringStrategy, TypeSet};
use crate::policy::PolicySnapshot;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Audit log export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Monitoring policy at export time
    pub policy: PolicyExport,

    /// Exported records, newest first
    pub records: Vec<AuditRecord>,

    /// Export metadata
    pub metadata: ExportMetadata,
}

/// Declared monitoring policy
///
/// Only the lists as configured; implicitly monitored types are derived
/// again from the schema on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyExport {
    pub strategy: MonitoringStrategy,
    pub monitored_classes: TypeSet,
    pub unmonitored_classes: TypeSet,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub record_count: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub deleted_count: usize,

    /// Timestamp of the oldest record
    pub earliest_record: Option<DateTime<Utc>>,

    /// Timestamp of the newest record
    pub latest_record: Option<DateTime<Utc>>,
}

impl ExportMetadata {
    fn from_records(records: &[AuditRecord]) -> Self {
        let count = |action: Action| records.iter().filter(|r| r.action() == action).count();

        Self {
            record_count: records.len(),
            created_count: count(Action::Created),
            updated_count: count(Action::Updated),
            deleted_count: count(Action::Deleted),
            earliest_record: records.iter().map(AuditRecord::created_at).min(),
            latest_record: records.iter().map(AuditRecord::created_at).max(),
        }
    }
}

impl AuditExport {
    /// Create a new export from a policy snapshot and query results
    pub fn new(policy: &PolicySnapshot, records: Vec<AuditRecord>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            policy: PolicyExport {
                strategy: policy.strategy,
                monitored_classes: (*policy.monitored).clone(),
                unmonitored_classes: (*policy.unmonitored).clone(),
            },
            metadata: ExportMetadata::from_records(&records),
            records,
        }
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        if self.metadata.record_count != self.records.len() {
            return Err(format!(
                "Metadata lists {} records but the export holds {}",
                self.metadata.record_count,
                self.records.len()
            ));
        }

        let mut seen = HashSet::new();
        for record in &self.records {
            if !seen.insert(record.uuid()) {
                return Err(format!("Record {} appears more than once", record.uuid()));
            }
        }

        Ok(())
    }
}

/// Write an export as JSON
pub fn export_json<W: Write>(export: &AuditExport, writer: &mut W, pretty: bool) -> AuditResult<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, export)
    } else {
        serde_json::to_writer(writer, export)
    }
    .map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export
pub fn import_from_json(json_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport = serde_json::from_str(json_str)?;
    export.validate().map_err(AuditError::Validation)?;
    Ok(export)
}
