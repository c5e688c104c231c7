//! auditlog - monitoring policy and change capture for audited entities
//!
//! This library decides which entity types of a host application are
//! audited, turns lifecycle events (create, update, delete, collection
//! changes) into field-level audit records, and stores and queries them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Paths, settings, and the configuration store contract
//! - `error`: Custom error types
//! - `models`: Type names, strategies, property values, subjects
//! - `schema`: Type metadata registry and the type graph index
//! - `policy`: Monitoring policy cache and resolver
//! - `audit`: Change capture, record assembly, transactions, repository
//! - `storage`: JSON/JSONL file storage layer
//! - `services`: Service facade used by the CLI and host integrations
//! - `display`, `export`, `cli`: Terminal output, exports, command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use auditlog::schema::TypeRegistry;
//! use auditlog::services::AuditLogService;
//!
//! let service = AuditLogService::in_memory(TypeRegistry::from_descriptors(types));
//! service.start_monitoring(&["clinic.Concept"])?;
//!
//! let mut tx = service.begin(Some("admin"));
//! tx.record_update(&concept, &before, &after);
//! tx.commit()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod policy;
pub mod schema;
pub mod services;
pub mod storage;

pub use error::{AuditError, AuditResult};
