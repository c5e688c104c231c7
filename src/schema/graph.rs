//! Type graph queries
//!
//! Answers subclass and association questions over whatever the metadata
//! provider exposes. Lookups that fail are logged and treated as "no
//! metadata" so auditing never blocks ordinary writes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::warn;

use crate::models::{TypeName, TypeSet};

use super::descriptor::{PropertyDescriptor, TypeDescriptor};
use super::TypeMetadata;

/// Subclass and association index over a metadata provider
#[derive(Clone)]
pub struct TypeGraphIndex {
    metadata: Arc<dyn TypeMetadata>,
}

impl TypeGraphIndex {
    pub fn new(metadata: Arc<dyn TypeMetadata>) -> Self {
        Self { metadata }
    }

    /// Describe a type, swallowing provider failures
    pub fn describe(&self, name: &TypeName) -> Option<Arc<TypeDescriptor>> {
        match self.metadata.describe(name) {
            Ok(found) => found,
            Err(e) => {
                warn!(type_name = %name, error = %e, "type metadata lookup failed");
                None
            }
        }
    }

    /// Every type the provider knows about
    pub fn all_types(&self) -> TypeSet {
        match self.metadata.type_names() {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "listing mapped types failed");
                TypeSet::new()
            }
        }
    }

    /// Resolve a configured name to a registered type
    ///
    /// Exact names win; otherwise a unique simple-name match is accepted
    /// (`Concept` for `clinic.Concept`).
    pub fn resolve(&self, name: &str) -> Option<TypeName> {
        let candidate = TypeName::new(name);
        if candidate.as_str().is_empty() {
            return None;
        }
        if self.describe(&candidate).is_some() {
            return Some(candidate);
        }

        let mut matches = self
            .all_types()
            .into_iter()
            .filter(|t| t.simple_name() == candidate.as_str());
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// All transitive parents (supertypes and interfaces) of a type
    pub fn ancestors(&self, name: &TypeName) -> TypeSet {
        let mut found = TypeSet::new();
        let mut queue: VecDeque<TypeName> = VecDeque::new();
        queue.push_back(name.clone());

        while let Some(current) = queue.pop_front() {
            let Some(descriptor) = self.describe(&current) else {
                continue;
            };
            for parent in descriptor.parents() {
                if parent != name && found.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }

        found
    }

    /// Whether `candidate` is a proper subtype of `ancestor`
    pub fn is_subtype_of(&self, candidate: &TypeName, ancestor: &TypeName) -> bool {
        candidate != ancestor && self.ancestors(candidate).contains(ancestor)
    }

    /// Whether a type carries the auditable-object capability, directly or
    /// through one of its parents
    pub fn is_auditable(&self, name: &TypeName) -> bool {
        let Some(descriptor) = self.describe(name) else {
            return false;
        };
        if descriptor.auditable {
            return true;
        }
        self.ancestors(name)
            .iter()
            .filter_map(|parent| self.describe(parent))
            .any(|parent| parent.auditable)
    }

    /// Concrete subtypes of a type, transitively
    ///
    /// Abstract types and interfaces are skipped but still traversed, so a
    /// concrete type below an abstract one is found.
    pub fn concrete_subclasses_of(&self, name: &TypeName) -> TypeSet {
        let universe = self.descriptors();
        let mut children: HashMap<&TypeName, Vec<&TypeDescriptor>> = HashMap::new();
        for descriptor in universe.values() {
            for parent in descriptor.parents() {
                children.entry(parent).or_default().push(descriptor.as_ref());
            }
        }

        let mut found = TypeSet::new();
        let mut visited: HashSet<&TypeName> = HashSet::new();
        let mut queue: VecDeque<&TypeName> = VecDeque::new();
        visited.insert(name);
        queue.push_back(name);

        while let Some(current) = queue.pop_front() {
            for child in children.get(current).into_iter().flatten() {
                if !visited.insert(&child.name) {
                    continue;
                }
                if child.is_concrete() {
                    found.insert(child.name.clone());
                }
                queue.push_back(&child.name);
            }
        }

        found
    }

    /// Auditable types reachable through one-to-one and collection
    /// properties, recursively
    ///
    /// A type that owns instances of itself (directly or through a cycle)
    /// is part of its own result. Each type is expanded once.
    pub fn association_types_of(&self, name: &TypeName) -> TypeSet {
        let mut visited = TypeSet::new();
        let mut found = TypeSet::new();
        self.collect_associations(name, &mut visited, &mut found);
        found
    }

    fn collect_associations(&self, name: &TypeName, visited: &mut TypeSet, found: &mut TypeSet) {
        for property in self.properties_of(name) {
            let Some(target) = property.kind.association_target() else {
                continue;
            };
            if !self.is_auditable(target) || !visited.insert(target.clone()) {
                continue;
            }
            found.insert(target.clone());
            self.collect_associations(target, visited, found);
        }
    }

    /// Declared and inherited properties
    ///
    /// Inherited properties come first; a property redeclared by a subtype
    /// replaces the inherited one.
    pub fn properties_of(&self, name: &TypeName) -> Vec<PropertyDescriptor> {
        let mut chain = Vec::new();
        let mut seen = TypeSet::new();
        let mut current = Some(name.clone());
        while let Some(type_name) = current {
            if !seen.insert(type_name.clone()) {
                break;
            }
            let Some(descriptor) = self.describe(&type_name) else {
                break;
            };
            current = descriptor.supertype.clone();
            chain.push(descriptor);
        }

        let mut properties: Vec<PropertyDescriptor> = Vec::new();
        for descriptor in chain.iter().rev() {
            for property in &descriptor.properties {
                match properties.iter_mut().find(|p| p.name == property.name) {
                    Some(existing) => *existing = property.clone(),
                    None => properties.push(property.clone()),
                }
            }
        }
        properties
    }

    fn descriptors(&self) -> HashMap<TypeName, Arc<TypeDescriptor>> {
        self.all_types()
            .into_iter()
            .filter_map(|name| self.describe(&name).map(|d| (name, d)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuditError, AuditResult};
    use crate::schema::TypeRegistry;
    use crate::storage::init::demo_schema;

    fn index() -> TypeGraphIndex {
        TypeGraphIndex::new(Arc::new(TypeRegistry::from_descriptors(demo_schema())))
    }

    fn names(set: &TypeSet) -> Vec<&str> {
        set.iter().map(TypeName::as_str).collect()
    }

    #[test]
    fn test_concrete_subclasses_of_concept() {
        let subclasses = index().concrete_subclasses_of(&"clinic.Concept".into());
        assert_eq!(
            names(&subclasses),
            vec!["clinic.ConceptComplex", "clinic.ConceptNumeric"]
        );
    }

    #[test]
    fn test_concrete_subclasses_skip_abstract_but_traverse_it() {
        let index = index();
        let subclasses = index.concrete_subclasses_of(&"clinic.Auditable".into());

        assert!(!subclasses.contains_name("clinic.BaseMetadata"));
        assert!(subclasses.contains_name("clinic.Location"));
        assert!(subclasses.contains_name("clinic.ConceptNumeric"));
        assert!(!subclasses.contains_name("clinic.Auditable"));
    }

    #[test]
    fn test_leaf_type_has_no_subclasses() {
        assert!(index()
            .concrete_subclasses_of(&"clinic.ConceptName".into())
            .is_empty());
    }

    #[test]
    fn test_association_types_are_recursive() {
        let assoc = index().association_types_of(&"clinic.Concept".into());
        // Concept.names -> ConceptName.tags -> ConceptNameTag
        assert!(assoc.contains_name("clinic.ConceptNameTag"));

        let assoc = index().association_types_of(&"clinic.Patient".into());
        assert!(assoc.contains_name("clinic.PersonName"));
        assert!(assoc.contains_name("clinic.PatientIdentifier"));
    }

    #[test]
    fn test_association_types_skip_plain_references() {
        let assoc = index().association_types_of(&"clinic.Concept".into());
        assert!(assoc.contains_name("clinic.ConceptName"));
        assert!(assoc.contains_name("clinic.ConceptDescription"));
        assert!(!assoc.contains_name("clinic.ConceptClass"));
        assert!(!assoc.contains_name("clinic.ConceptDatatype"));
    }

    #[test]
    fn test_association_cycle_terminates() {
        // Location.childLocations -> Location
        let assoc = index().association_types_of(&"clinic.Location".into());
        assert!(assoc.contains_name("clinic.Location"));
        assert_eq!(assoc.len(), 1);
    }

    #[test]
    fn test_association_cycle_through_other_type() {
        let registry = TypeRegistry::from_descriptors(vec![
            TypeDescriptor::new("shop.Order")
                .property(PropertyDescriptor::collection("lines", "shop.OrderLine")),
            TypeDescriptor::new("shop.OrderLine")
                .property(PropertyDescriptor::one_to_one("order", "shop.Order")),
        ]);
        let index = TypeGraphIndex::new(Arc::new(registry));

        let assoc = index.association_types_of(&"shop.Order".into());
        assert!(assoc.contains_name("shop.OrderLine"));
        assert!(assoc.contains_name("shop.Order"));
        assert_eq!(assoc.len(), 2);
    }

    #[test]
    fn test_association_types_skip_non_auditable_targets() {
        let index = index();
        let assoc = index.association_types_of(&"clinic.Concept".into());
        assert!(!assoc.contains_name("clinic.Setting"));
        assert!(!index.is_auditable(&"clinic.Setting".into()));
    }

    #[test]
    fn test_auditable_is_inherited() {
        let index = index();
        assert!(index.is_auditable(&"clinic.EncounterType".into()));
        assert!(index.is_auditable(&"clinic.ConceptNumeric".into()));
        assert!(!index.is_auditable(&"clinic.Unknown".into()));
    }

    #[test]
    fn test_inherited_properties() {
        let props = index().properties_of(&"clinic.ConceptNumeric".into());
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"version"));
        assert!(names.contains(&"units"));
        assert!(names.iter().position(|n| *n == "version") < names.iter().position(|n| *n == "units"));
    }

    #[test]
    fn test_resolve_by_simple_name() {
        let index = index();
        assert_eq!(
            index.resolve("Concept").map(|t| t.to_string()),
            Some("clinic.Concept".to_string())
        );
        assert_eq!(
            index.resolve(" clinic.Location ").map(|t| t.to_string()),
            Some("clinic.Location".to_string())
        );
        assert!(index.resolve("org.nowhere.Thing").is_none());
        assert!(index.resolve("").is_none());
    }

    #[test]
    fn test_late_registration_is_visible() {
        let registry = Arc::new(TypeRegistry::from_descriptors(demo_schema()));
        let index = TypeGraphIndex::new(registry.clone());
        registry.register(
            crate::schema::TypeDescriptor::new("clinic.ConceptCoded").extends("clinic.Concept"),
        );

        assert!(index
            .concrete_subclasses_of(&"clinic.Concept".into())
            .contains_name("clinic.ConceptCoded"));
    }

    struct BrokenMetadata;

    impl TypeMetadata for BrokenMetadata {
        fn type_names(&self) -> AuditResult<Vec<TypeName>> {
            Err(AuditError::Metadata("session closed".into()))
        }

        fn describe(&self, _name: &TypeName) -> AuditResult<Option<Arc<TypeDescriptor>>> {
            Err(AuditError::Metadata("session closed".into()))
        }
    }

    #[test]
    fn test_metadata_failure_fails_open() {
        let index = TypeGraphIndex::new(Arc::new(BrokenMetadata));
        let concept: TypeName = "clinic.Concept".into();

        assert!(index.concrete_subclasses_of(&concept).is_empty());
        assert!(index.association_types_of(&concept).is_empty());
        assert!(index.properties_of(&concept).is_empty());
        assert!(!index.is_auditable(&concept));
        assert!(index.all_types().is_empty());
    }
}
