//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod export;
pub mod ingest;
pub mod log;
pub mod policy;

pub use export::{handle_export_command, ExportArgs, ExportFormat};
pub use ingest::{handle_ingest_command, IngestArgs};
pub use log::{handle_log_command, LogCommands, RecordFilterArgs};
pub use policy::{handle_monitor_command, handle_strategy_command, MonitorCommands, StrategyCommands};
