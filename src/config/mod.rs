//! Configuration module for auditlog
//!
//! This module provides configuration management including:
//! - Path resolution for settings, schema, properties and the audit log
//! - User settings persistence
//! - The configuration keys the monitoring policy reads and the store
//!   contract it reads them from

pub mod keys;
pub mod paths;
pub mod settings;
pub mod store;

pub use paths::AuditPaths;
pub use settings::Settings;
pub use store::{ConfigEvent, ConfigStore};
