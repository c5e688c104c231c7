//! Service layer for auditlog
//!
//! The service layer sits on top of the storage layer and the policy cache,
//! resolving user-entered type names, validating query parameters and
//! replaying host events.

pub mod audit_log;
pub mod ingest;

pub use audit_log::{AuditLogQuery, AuditLogService, TypeStatus};
pub use ingest::{parse_events, HostEvent, IngestResult, IngestService};
