//! CSV Export functionality
//!
//! One row per changed property, so spreadsheets can filter on a single
//! field. Records without changes (creates and deletes) get one row with
//! empty change columns.

use std::io::Write;

use crate::audit::AuditRecord;
use crate::error::{AuditError, AuditResult};

const HEADER: [&str; 10] = [
    "Record ID",
    "Created At",
    "Action",
    "Type",
    "Subject UUID",
    "Subject ID",
    "Creator",
    "Property",
    "Previous",
    "New",
];

/// Export audit records to CSV, returning the number of rows written
pub fn export_records_csv<W: Write>(records: &[AuditRecord], writer: W) -> AuditResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(export_error)?;

    let mut rows = 0;
    for record in records {
        let id = record.uuid().as_uuid().to_string();
        let created_at = record.created_at().to_rfc3339();
        let subject_uuid = record.subject_uuid().to_string();
        let subject_id = record
            .subject_id()
            .map(|id| id.to_string())
            .unwrap_or_default();
        let prefix = [
            id.as_str(),
            created_at.as_str(),
            record.action().as_str(),
            record.subject_type().as_str(),
            subject_uuid.as_str(),
            subject_id.as_str(),
            record.creator(),
        ];

        if record.changes().is_empty() {
            csv_writer
                .write_record(prefix.iter().chain(&["", "", ""]))
                .map_err(export_error)?;
            rows += 1;
            continue;
        }

        for (property, change) in record.changes().iter() {
            let previous = change.previous.as_deref().unwrap_or("");
            let new = change.new.as_deref().unwrap_or("");
            csv_writer
                .write_record(prefix.iter().chain(&[property, previous, new]))
                .map_err(export_error)?;
            rows += 1;
        }
    }

    csv_writer.flush().map_err(|e| AuditError::Export(e.to_string()))?;
    Ok(rows)
}

fn export_error(e: csv::Error) -> AuditError {
    AuditError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Action, ChangeSet};
    use crate::models::AuditSubject;
    use uuid::Uuid;

    fn read_rows(bytes: &[u8]) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_reader(bytes);
        reader.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_one_row_per_change() {
        let mut changes = ChangeSet::new();
        changes.insert("name", Some("Old, name".into()), Some("New".into()));
        changes.insert("retired", None, Some("true".into()));
        let subject = AuditSubject::new("clinic.Concept", Uuid::new_v4()).with_id(7);
        let updated = AuditRecord::new(Action::Updated, &subject, changes, "admin");
        let created = AuditRecord::new(Action::Created, &subject, ChangeSet::new(), "admin");

        let mut buffer = Vec::new();
        let rows = export_records_csv(&[updated, created], &mut buffer).unwrap();
        assert_eq!(rows, 3);

        let records = read_rows(&buffer);
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][2], "UPDATED");
        assert_eq!(&records[0][5], "7");
        assert_eq!(&records[0][7], "name");
        assert_eq!(&records[0][8], "Old, name");
        assert_eq!(&records[1][7], "retired");
        assert_eq!(&records[1][8], "");
        assert_eq!(&records[2][2], "CREATED");
        assert_eq!(&records[2][7], "");
    }

    #[test]
    fn test_empty_export_has_header() {
        let mut buffer = Vec::new();
        assert_eq!(export_records_csv(&[], &mut buffer).unwrap(), 0);
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Record ID,Created At,Action"));
    }
}
