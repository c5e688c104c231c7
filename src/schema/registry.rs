//! In-memory type registry
//!
//! The registry is the host-side metadata provider: it is loaded once from
//! the schema file at startup, and types may be registered later as the host
//! maps new entities.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::AuditResult;
use crate::models::TypeName;

use super::descriptor::TypeDescriptor;
use super::TypeMetadata;

/// Metadata provider backed by a map of descriptors
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeName, Arc<TypeDescriptor>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        let registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        registry
    }

    /// Register or replace a type
    pub fn register(&self, descriptor: TypeDescriptor) {
        self.types
            .write()
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    /// Remove a type, returning true if it was registered
    pub fn unregister(&self, name: &TypeName) -> bool {
        self.types.write().remove(name).is_some()
    }

    /// All descriptors sorted by name
    pub fn descriptors(&self) -> Vec<TypeDescriptor> {
        let mut all: Vec<TypeDescriptor> = self
            .types
            .read()
            .values()
            .map(|d| d.as_ref().clone())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl TypeMetadata for TypeRegistry {
    fn type_names(&self) -> AuditResult<Vec<TypeName>> {
        Ok(self.types.read().keys().cloned().collect())
    }

    fn describe(&self, name: &TypeName) -> AuditResult<Option<Arc<TypeDescriptor>>> {
        Ok(self.types.read().get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_describe() {
        let registry = TypeRegistry::new();
        registry.register(TypeDescriptor::new("org.example.Concept"));

        let found = registry
            .describe(&TypeName::from("org.example.Concept"))
            .unwrap();
        assert!(found.is_some());
        assert!(registry
            .describe(&TypeName::from("org.example.Missing"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_register_replaces() {
        let registry = TypeRegistry::new();
        registry.register(TypeDescriptor::new("x.A"));
        registry.register(TypeDescriptor::new("x.A").abstract_type());

        assert_eq!(registry.len(), 1);
        let found = registry.describe(&TypeName::from("x.A")).unwrap().unwrap();
        assert!(found.is_abstract);
    }

    #[test]
    fn test_descriptors_sorted() {
        let registry = TypeRegistry::from_descriptors(vec![
            TypeDescriptor::new("x.B"),
            TypeDescriptor::new("x.A"),
        ]);
        let names: Vec<String> = registry
            .descriptors()
            .into_iter()
            .map(|d| d.name.to_string())
            .collect();
        assert_eq!(names, vec!["x.A", "x.B"]);

        assert!(registry.unregister(&TypeName::from("x.A")));
        assert_eq!(registry.len(), 1);
    }
}
