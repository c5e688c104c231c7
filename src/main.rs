use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use auditlog::cli::{
    handle_export_command, handle_ingest_command, handle_log_command, handle_monitor_command,
    handle_strategy_command, ExportArgs, IngestArgs, LogCommands, MonitorCommands,
    StrategyCommands,
};
use auditlog::config::{keys, paths::AuditPaths, settings::Settings};
use auditlog::display::format_type_list;
use auditlog::services::AuditLogService;
use auditlog::storage::Storage;

#[derive(Parser)]
#[command(
    name = "auditlog",
    author = "Kaylee Beyene",
    version,
    about = "Monitoring policy and field-level change capture for audited entities",
    long_about = "auditlog decides which entity types are audited, captures \
                  field-level changes as audit records, and lets you query and \
                  export the resulting log from the command line."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory with a demo schema
    Init,

    /// Show current configuration and paths
    Config,

    /// List registered types and whether they are audited
    Types,

    /// Monitoring strategy commands
    #[command(subcommand)]
    Strategy(StrategyCommands),

    /// Start, stop and inspect monitoring of types
    #[command(subcommand)]
    Monitor(MonitorCommands),

    /// Query the audit log
    #[command(subcommand)]
    Log(LogCommands),

    /// Replay host lifecycle events from a JSON Lines file
    Ingest(IngestArgs),

    /// Export audit records
    Export(ExportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    auditlog::logging::init(settings.log.level, settings.log.format)?;

    let command = match cli.command {
        Some(Commands::Init) => {
            println!("Initializing auditlog at: {}", paths.base_dir().display());
            auditlog::storage::initialize_storage(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("A demo schema of clinic.* types has been written to:");
            println!("  {}", paths.schema_file().display());
            println!();
            println!("Run 'auditlog types' to see all types.");
            return Ok(());
        }
        Some(Commands::Config) => {
            print_config(&paths, &settings)?;
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("auditlog - audit policy and change capture");
            println!();
            println!("Run 'auditlog --help' for usage information.");
            println!("Run 'auditlog init' to get started.");
            return Ok(());
        }
    };

    let storage = Storage::open(paths)?;
    if !storage.is_initialized() {
        bail!("auditlog is not initialized. Run 'auditlog init' first.");
    }
    let service = AuditLogService::from_storage(&storage, &settings);

    match command {
        Commands::Types => print!("{}", format_type_list(&service.type_overview())),
        Commands::Strategy(cmd) => handle_strategy_command(&service, cmd)?,
        Commands::Monitor(cmd) => handle_monitor_command(&service, cmd)?,
        Commands::Log(cmd) => handle_log_command(&service, &settings, cmd)?,
        Commands::Ingest(args) => handle_ingest_command(&service, args)?,
        Commands::Export(args) => handle_export_command(&service, args)?,
        Commands::Init | Commands::Config => {}
    }

    Ok(())
}

fn print_config(paths: &AuditPaths, settings: &Settings) -> Result<()> {
    println!("auditlog Configuration");
    println!("======================");
    println!("Base directory:   {}", paths.base_dir().display());
    println!("Schema file:      {}", paths.schema_file().display());
    println!("Properties file:  {}", paths.properties_file().display());
    println!("Audit log:        {}", paths.audit_log().display());
    println!();
    println!("Settings:");
    println!("  Default creator:    {}", settings.default_creator);
    println!("  Ignored properties: {}", settings.ignored_properties.join(", "));
    println!("  Log level:          {}", settings.log.level.as_str());
    println!("  Date format:        {}", settings.date_format);

    if !paths.is_initialized() {
        println!();
        println!("Not initialized. Run 'auditlog init'.");
        return Ok(());
    }

    let storage = Storage::open(paths.clone())?;
    println!();
    println!("Policy properties:");
    for key in [
        keys::MONITORING_STRATEGY,
        keys::MONITORED_CLASSES,
        keys::UN_MONITORED_CLASSES,
    ] {
        match storage.properties.entry(key) {
            Some(entry) => println!("  {} = {} (v{})", key, entry.value, entry.version),
            None => println!("  {} (unset)", key),
        }
    }

    let others: Vec<_> = storage
        .properties
        .entries()
        .into_iter()
        .filter(|(key, _)| !keys::is_policy_key(key))
        .collect();
    if !others.is_empty() {
        println!();
        println!("Other properties:");
        for (key, entry) in others {
            println!("  {} = {}", key, entry.value);
        }
    }

    Ok(())
}
