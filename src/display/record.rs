//! Audit record display formatting
//!
//! Formats audit records for terminal output in table and detail views.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::AuditRecord;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "By")]
    creator: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

impl RecordRow {
    fn new(record: &AuditRecord, date_format: &str) -> Self {
        let subject = match record.subject_id() {
            Some(id) => format!("#{}", id),
            None => record.subject_uuid().to_string()[..8].to_string(),
        };
        let changes = match record.changes().len() {
            0 => String::new(),
            1 => "1 property".to_string(),
            n => format!("{} properties", n),
        };

        Self {
            id: record.uuid().to_string(),
            when: record.created_at().format(date_format).to_string(),
            action: record.action().as_str(),
            type_name: record.subject_type().simple_name().to_string(),
            subject,
            creator: record.creator().to_string(),
            changes,
        }
    }
}

/// Format a list of audit records as a table
pub fn format_record_list(records: &[AuditRecord], date_format: &str) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let rows = records.iter().map(|r| RecordRow::new(r, date_format));
    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n\n{} record(s)\n", table, records.len())
}

/// Format a single record with its full change set
pub fn format_record_details(record: &AuditRecord, date_format: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Audit record: {}\n", record.uuid().as_uuid()));
    output.push_str(&format!("  Action:   {}\n", record.action()));
    output.push_str(&format!("  Type:     {}\n", record.subject_type()));
    output.push_str(&format!("  Subject:  {}\n", record.subject_uuid()));
    if let Some(id) = record.subject_id() {
        output.push_str(&format!("  Row ID:   {}\n", id));
    }
    output.push_str(&format!("  By:       {}\n", record.creator()));
    output.push_str(&format!(
        "  When:     {}\n",
        record.created_at().format(date_format)
    ));

    if record.changes().is_empty() {
        return output;
    }

    let width = record
        .changes()
        .property_names()
        .map(str::len)
        .max()
        .unwrap_or(8)
        .max(8);

    output.push('\n');
    output.push_str(&format!(
        "  {:<width$}  {:<24}  {}\n",
        "Property",
        "Previous",
        "New",
        width = width
    ));
    output.push_str(&format!(
        "  {:-<width$}  {:-<24}  {:-<24}\n",
        "",
        "",
        "",
        width = width
    ));
    for (property, change) in record.changes().iter() {
        output.push_str(&format!(
            "  {:<width$}  {:<24}  {}\n",
            property,
            change.previous.as_deref().unwrap_or("(none)"),
            change.new.as_deref().unwrap_or("(none)"),
            width = width
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Action, ChangeSet};
    use crate::models::AuditSubject;
    use uuid::Uuid;

    const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    fn updated_record() -> AuditRecord {
        let mut changes = ChangeSet::new();
        changes.insert("description", None, Some("Body weight".into()));
        changes.insert("units", Some("kg".into()), Some("lb".into()));
        let subject = AuditSubject::new("clinic.ConceptNumeric", Uuid::new_v4()).with_id(5089);
        AuditRecord::new(Action::Updated, &subject, changes, "admin")
    }

    #[test]
    fn test_format_empty_list() {
        assert_eq!(format_record_list(&[], DATE_FORMAT), "No audit records found.");
    }

    #[test]
    fn test_format_record_list() {
        let output = format_record_list(&[updated_record()], DATE_FORMAT);
        assert!(output.contains("ConceptNumeric"));
        assert!(output.contains("UPDATED"));
        assert!(output.contains("#5089"));
        assert!(output.contains("2 properties"));
        assert!(output.contains("1 record(s)"));
    }

    #[test]
    fn test_format_record_details() {
        let output = format_record_details(&updated_record(), DATE_FORMAT);
        assert!(output.contains("clinic.ConceptNumeric"));
        assert!(output.contains("Row ID:   5089"));
        assert!(output.contains("units"));
        assert!(output.contains("(none)"));
        assert!(output.contains("Body weight"));
    }
}
