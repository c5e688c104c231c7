//! Audit log CLI commands
//!
//! Implements `log list` and `log show`, and the record filter shared with
//! `export`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Subcommand};

use crate::audit::Action;
use crate::config::Settings;
use crate::display::{format_record_details, format_record_list};
use crate::error::{AuditError, AuditResult};
use crate::services::{AuditLogQuery, AuditLogService};

/// Filters for selecting audit records
#[derive(Args, Debug, Default)]
pub struct RecordFilterArgs {
    /// Only these types and their subclasses (repeatable)
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,
    /// Only these actions: created, updated, deleted (repeatable)
    #[arg(short, long = "action")]
    pub actions: Vec<String>,
    /// Records at or after this time (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub since: Option<String>,
    /// Records at or before this time (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub until: Option<String>,
}

impl RecordFilterArgs {
    /// Build a service query from the arguments
    pub fn to_query(&self) -> AuditResult<AuditLogQuery> {
        let actions = self
            .actions
            .iter()
            .map(|a| a.parse::<Action>())
            .collect::<AuditResult<Vec<_>>>()?;

        Ok(AuditLogQuery {
            types: (!self.types.is_empty()).then(|| self.types.clone()),
            actions: (!actions.is_empty()).then_some(actions),
            start_date: self
                .since
                .as_deref()
                .map(|s| parse_time(s, NaiveTime::MIN))
                .transpose()?,
            end_date: self
                .until
                .as_deref()
                .map(|s| parse_time(s, end_of_day()))
                .transpose()?,
            offset: None,
            limit: None,
        })
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Parse an RFC 3339 timestamp, or a bare date at `time_of_day` UTC
fn parse_time(input: &str, time_of_day: NaiveTime) -> AuditResult<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|_| {
            AuditError::Validation(format!(
                "Invalid date '{}'. Use YYYY-MM-DD or an RFC 3339 timestamp",
                input
            ))
        })
}

/// Log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// List audit records, newest first
    List {
        #[command(flatten)]
        filter: RecordFilterArgs,
        /// Skip this many records
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Number of records to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show one record with its changes
    Show {
        /// Record ID (full UUID, log-xxxxxxxx, or a UUID prefix)
        id: String,
    },
}

/// Handle a log command
pub fn handle_log_command(
    service: &AuditLogService,
    settings: &Settings,
    cmd: LogCommands,
) -> AuditResult<()> {
    match cmd {
        LogCommands::List {
            filter,
            offset,
            limit,
        } => {
            let mut query = filter.to_query()?;
            query.offset = Some(offset);
            query.limit = Some(limit);

            let records = service.get_audit_logs(&query)?;
            print!("{}", format_record_list(&records, &settings.date_format));
        }

        LogCommands::Show { id } => {
            let record = service.find_audit_log(&id)?;
            print!("{}", format_record_details(&record, &settings.date_format));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        let start = parse_time("2026-03-01", NaiveTime::MIN).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");

        let end = parse_time("2026-03-01", end_of_day()).unwrap();
        assert_eq!(end.to_rfc3339(), "2026-03-01T23:59:59+00:00");

        let exact = parse_time("2026-03-01T10:30:00+02:00", NaiveTime::MIN).unwrap();
        assert_eq!(exact.to_rfc3339(), "2026-03-01T08:30:00+00:00");

        assert!(parse_time("yesterday", NaiveTime::MIN)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_filter_to_query() {
        let filter = RecordFilterArgs {
            types: vec!["Concept".into()],
            actions: vec!["updated".into()],
            since: Some("2026-01-01".into()),
            until: None,
        };
        let query = filter.to_query().unwrap();
        assert_eq!(query.types, Some(vec!["Concept".to_string()]));
        assert_eq!(query.actions, Some(vec![Action::Updated]));
        assert!(query.start_date.is_some());
        assert!(query.end_date.is_none());

        let empty = RecordFilterArgs::default().to_query().unwrap();
        assert!(empty.types.is_none());
        assert!(empty.actions.is_none());
    }

    #[test]
    fn test_filter_rejects_unknown_action() {
        let filter = RecordFilterArgs {
            actions: vec!["voided".into()],
            ..Default::default()
        };
        assert!(filter.to_query().unwrap_err().is_validation());
    }
}
