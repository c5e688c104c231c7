//! Core data models for auditlog
//!
//! This module contains the value types shared by the policy and capture
//! layers: type names and sets, monitoring strategies, entity snapshots.

pub mod ids;
pub mod strategy;
pub mod subject;
pub mod type_name;
pub mod value;

pub use ids::AuditRecordId;
pub use strategy::MonitoringStrategy;
pub use subject::AuditSubject;
pub use type_name::{TypeName, TypeSet};
pub use value::{EntityRef, PropertyState, PropertyValue, REFERENCE_LABEL};
