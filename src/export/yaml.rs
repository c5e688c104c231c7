//! YAML Export functionality
//!
//! Same document as the JSON export, for reading by people.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::export::json::AuditExport;

/// Write an export as YAML
pub fn export_yaml<W: Write>(export: &AuditExport, writer: &mut W) -> AuditResult<()> {
    writeln!(writer, "# auditlog export").map_err(export_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_error)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_error)?;
    writeln!(
        writer,
        "# Records: {} (strategy {})",
        export.metadata.record_count, export.policy.strategy
    )
    .map_err(export_error)?;
    writeln!(writer).map_err(export_error)?;

    serde_yaml::to_writer(writer, export).map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

fn export_error(e: std::io::Error) -> AuditError {
    AuditError::Export(e.to_string())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> AuditResult<AuditExport> {
    let export: AuditExport =
        serde_yaml::from_str(yaml_str).map_err(|e| AuditError::Validation(e.to_string()))?;
    export.validate().map_err(AuditError::Validation)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Action, AuditRecord, ChangeSet};
    use crate::models::{AuditSubject, MonitoringStrategy, TypeSet};
    use crate::policy::PolicySnapshot;
    use std::sync::Arc;
    use uuid::Uuid;

    fn export() -> AuditExport {
        let snapshot = PolicySnapshot {
            strategy: MonitoringStrategy::All,
            monitored: Arc::new(TypeSet::new()),
            unmonitored: Arc::new(TypeSet::new()),
            implicit: Arc::new(TypeSet::new()),
        };
        let mut changes = ChangeSet::new();
        changes.insert("name", Some("Old".into()), Some("New".into()));
        let subject = AuditSubject::new("clinic.Location", Uuid::new_v4());
        let record = AuditRecord::new(Action::Updated, &subject, changes, "admin");
        AuditExport::new(&snapshot, vec![record])
    }

    #[test]
    fn test_yaml_export_has_header() {
        let mut buffer = Vec::new();
        export_yaml(&export(), &mut buffer).unwrap();

        let yaml = String::from_utf8(buffer).unwrap();
        assert!(yaml.starts_with("# auditlog export"));
        assert!(yaml.contains("clinic.Location"));
        assert!(yaml.contains("strategy: ALL"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let original = export();
        let mut buffer = Vec::new();
        export_yaml(&original, &mut buffer).unwrap();

        let imported = import_from_yaml(&String::from_utf8(buffer).unwrap()).unwrap();
        assert_eq!(imported.records, original.records);
    }
}
