//! CLI command for replaying host events

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Args;

use crate::error::{AuditError, AuditResult};
use crate::services::{parse_events, AuditLogService, IngestService};

/// Arguments for `ingest`
#[derive(Args)]
pub struct IngestArgs {
    /// JSON Lines file of lifecycle events
    pub file: PathBuf,
    /// Creator to stamp on records (defaults to the configured creator)
    #[arg(short, long)]
    pub creator: Option<String>,
    /// Report what would be recorded without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Handle the ingest command
pub fn handle_ingest_command(service: &AuditLogService, args: IngestArgs) -> AuditResult<()> {
    let file = File::open(&args.file).map_err(|e| {
        AuditError::Io(format!("Failed to open {}: {}", args.file.display(), e))
    })?;
    let events = parse_events(BufReader::new(file))?;

    let result =
        IngestService::new(service).replay(events, args.creator.as_deref(), args.dry_run)?;

    if args.dry_run {
        println!("Dry run: nothing was written.");
    }
    println!("Events:        {}", result.events);
    println!("Records:       {}", result.records);
    println!("Not audited:   {}", result.skipped);
    println!("Committed:     {}", result.committed);
    println!("Rolled back:   {}", result.rolled_back);

    Ok(())
}
