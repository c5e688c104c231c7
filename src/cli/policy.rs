//! Monitoring policy CLI commands
//!
//! Implements the `strategy` and `monitor` command groups.

use clap::Subcommand;

use crate::display::format_policy;
use crate::error::AuditResult;
use crate::models::MonitoringStrategy;
use crate::services::AuditLogService;

/// Strategy subcommands
#[derive(Subcommand)]
pub enum StrategyCommands {
    /// Show the current strategy and the lists it uses
    Show,
    /// Change the strategy
    Set {
        /// none, all, none_except or all_except
        strategy: String,
    },
}

/// Monitor subcommands
#[derive(Subcommand)]
pub enum MonitorCommands {
    /// Start auditing types (subclasses included)
    Start {
        /// Fully-qualified or simple type names
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Stop auditing types (subclasses included)
    Stop {
        /// Fully-qualified or simple type names
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Show the explicit and implicit lists
    List,
    /// Check whether a type is currently audited
    Check {
        /// Type name
        type_name: String,
    },
}

/// Handle a strategy command
pub fn handle_strategy_command(service: &AuditLogService, cmd: StrategyCommands) -> AuditResult<()> {
    match cmd {
        StrategyCommands::Show => {
            println!("{}", service.strategy());
        }

        StrategyCommands::Set { strategy } => {
            let strategy: MonitoringStrategy = strategy.parse()?;
            service.set_strategy(strategy)?;
            println!("Monitoring strategy set to {}", strategy);
        }
    }

    Ok(())
}

/// Handle a monitor command
pub fn handle_monitor_command(service: &AuditLogService, cmd: MonitorCommands) -> AuditResult<()> {
    match cmd {
        MonitorCommands::Start { types } => {
            service.start_monitoring(&types)?;
            println!("Started monitoring: {}", types.join(", "));
            warn_if_lists_unused(service);
        }

        MonitorCommands::Stop { types } => {
            service.stop_monitoring(&types)?;
            println!("Stopped monitoring: {}", types.join(", "));
            warn_if_lists_unused(service);
        }

        MonitorCommands::List => {
            print!("{}", format_policy(&service.policy(), &service.config_issues()));
        }

        MonitorCommands::Check { type_name } => {
            let resolved = service.resolve_type(&type_name)?;
            if service.is_monitored(&type_name)? {
                println!("{} is monitored", resolved);
            } else {
                println!("{} is not monitored", resolved);
            }
        }
    }

    Ok(())
}

/// Start and stop change nothing under NONE and ALL
fn warn_if_lists_unused(service: &AuditLogService) {
    let strategy = service.strategy();
    if !strategy.uses_explicit_lists() {
        println!(
            "Note: strategy {} ignores the monitored and unmonitored lists.",
            strategy
        );
    }
}
