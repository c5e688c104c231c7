//! CLI command for exporting audit records

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::cli::log::RecordFilterArgs;
use crate::error::{AuditError, AuditResult};
use crate::export::{export_json, export_records_csv, export_yaml, AuditExport};
use crate::services::AuditLogService;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// CSV format (one row per changed property)
    Csv,
    /// JSON format (records and policy)
    Json,
    /// YAML format (records and policy, human-readable)
    Yaml,
}

/// Arguments for `export`
#[derive(Args)]
pub struct ExportArgs {
    /// Output file path
    pub output: PathBuf,

    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub filter: RecordFilterArgs,
}

/// Handle the export command
pub fn handle_export_command(service: &AuditLogService, args: ExportArgs) -> AuditResult<()> {
    let records = service.get_audit_logs(&args.filter.to_query()?)?;

    let file = File::create(&args.output).map_err(|e| {
        AuditError::Export(format!(
            "Failed to create file {}: {}",
            args.output.display(),
            e
        ))
    })?;
    let mut writer = BufWriter::new(file);

    let count = records.len();
    let rows = match args.format {
        ExportFormat::Csv => Some(export_records_csv(&records, &mut writer)?),
        ExportFormat::Json => {
            let export = AuditExport::new(&service.policy(), records);
            export_json(&export, &mut writer, args.pretty)?;
            None
        }
        ExportFormat::Yaml => {
            let export = AuditExport::new(&service.policy(), records);
            export_yaml(&export, &mut writer)?;
            None
        }
    };

    writer
        .flush()
        .map_err(|e| AuditError::Export(e.to_string()))?;

    match rows {
        Some(rows) => println!(
            "Exported {} records ({} rows) to: {}",
            count,
            rows,
            args.output.display()
        ),
        None => println!("Exported {} records to: {}", count, args.output.display()),
    }
    Ok(())
}
