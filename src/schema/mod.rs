//! Host type metadata
//!
//! The policy and capture layers never inspect concrete host types. They go
//! through a `TypeMetadata` provider, wrapped by `TypeGraphIndex` for the
//! subclass and association queries.

pub mod descriptor;
pub mod graph;
pub mod registry;

use std::sync::Arc;

use crate::error::AuditResult;
use crate::models::TypeName;

pub use descriptor::{PropertyDescriptor, PropertyKind, TypeDescriptor};
pub use graph::TypeGraphIndex;
pub use registry::TypeRegistry;

/// Source of type metadata, implemented by the host's mapping layer
pub trait TypeMetadata: Send + Sync {
    /// Names of every mapped type
    fn type_names(&self) -> AuditResult<Vec<TypeName>>;

    /// Metadata for one type, `None` if the type is not mapped
    fn describe(&self, name: &TypeName) -> AuditResult<Option<Arc<TypeDescriptor>>>;
}
