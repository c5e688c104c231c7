//! Change capture and audit records
//!
//! Turns entity lifecycle events into immutable audit records.
//!
//! # Architecture
//!
//! - `ChangeCaptureEngine`: diffs before/after snapshots into a `ChangeSet`,
//!   suppressing differences that are not semantic changes.
//! - `AuditRecordAssembler`: asks the monitoring policy whether a type is
//!   audited and builds the `AuditRecord` for a create, update, delete or
//!   collection change.
//! - `AuditTransaction`: holds assembled records until the host write
//!   commits, then hands them to an `AuditRepository`.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut tx = service.begin(Some("admin"));
//! tx.record_update(&concept, &before, &after);
//! tx.commit()?;
//! ```

mod assembler;
mod changes;
mod diff;
mod entry;
mod repository;
mod transaction;

pub use assembler::AuditRecordAssembler;
pub use changes::{ChangeSet, PropertyChange};
pub use diff::ChangeCaptureEngine;
pub use entry::{Action, AuditRecord};
pub use repository::{AuditRepository, RecordQuery};
pub use transaction::AuditTransaction;
