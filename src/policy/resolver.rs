//! Monitoring decisions

use std::sync::Arc;

use crate::models::{MonitoringStrategy, TypeName, TypeSet};
use crate::schema::TypeGraphIndex;

use super::cache::PolicyCache;

/// Answers "is this type audited?" from the cached policy
pub struct MonitoringPolicyResolver {
    cache: Arc<PolicyCache>,
    graph: TypeGraphIndex,
}

impl MonitoringPolicyResolver {
    pub fn new(cache: Arc<PolicyCache>, graph: TypeGraphIndex) -> Self {
        Self { cache, graph }
    }

    pub fn cache(&self) -> &Arc<PolicyCache> {
        &self.cache
    }

    /// Whether changes to instances of `type_name` are audited
    ///
    /// Types without the auditable capability never are. Under `ALL_EXCEPT`
    /// an implicitly monitored type stays monitored even when it is listed
    /// as unmonitored, so owned children of an audited parent cannot drop
    /// out of the log.
    pub fn is_monitored(&self, type_name: &TypeName) -> bool {
        if !self.graph.is_auditable(type_name) {
            return false;
        }

        match self.cache.strategy() {
            MonitoringStrategy::None => false,
            MonitoringStrategy::All => true,
            MonitoringStrategy::NoneExcept => {
                self.cache.explicit_monitored().contains(type_name)
                    || self.cache.implicit_monitored().contains(type_name)
            }
            MonitoringStrategy::AllExcept => {
                !self.cache.explicit_unmonitored().contains(type_name)
                    || self.cache.implicit_monitored().contains(type_name)
            }
        }
    }

    /// Expand a query's type filter with concrete subclasses
    ///
    /// `None` means no filter. Types without the auditable capability are
    /// dropped, so a filter of only such types matches nothing.
    pub fn expand_filter(&self, types: Option<&[TypeName]>) -> Option<TypeSet> {
        let types = types?;
        let mut expanded = TypeSet::new();
        for type_name in types {
            if !self.graph.is_auditable(type_name) {
                continue;
            }
            expanded.insert(type_name.clone());
            expanded.extend(
                self.graph
                    .concrete_subclasses_of(type_name)
                    .into_iter()
                    .filter(|t| self.graph.is_auditable(t)),
            );
        }
        Some(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, ConfigStore};
    use crate::schema::{TypeDescriptor, TypeRegistry};
    use crate::storage::init::demo_schema;
    use crate::storage::PropertyStore;

    struct Fixture {
        store: Arc<PropertyStore>,
        registry: Arc<TypeRegistry>,
        resolver: MonitoringPolicyResolver,
    }

    fn fixture(strategy: &str, monitored: &str, unmonitored: &str) -> Fixture {
        let store = Arc::new(PropertyStore::in_memory());
        store.set_value(keys::MONITORING_STRATEGY, strategy).unwrap();
        store.set_value(keys::MONITORED_CLASSES, monitored).unwrap();
        store.set_value(keys::UN_MONITORED_CLASSES, unmonitored).unwrap();

        let registry = Arc::new(TypeRegistry::from_descriptors(demo_schema()));
        let graph = TypeGraphIndex::new(registry.clone());
        let cache = Arc::new(PolicyCache::new(store.clone(), graph.clone()));
        Fixture {
            store,
            registry,
            resolver: MonitoringPolicyResolver::new(cache, graph),
        }
    }

    fn monitored(f: &Fixture, name: &str) -> bool {
        f.resolver.is_monitored(&name.into())
    }

    #[test]
    fn test_none_monitors_nothing() {
        let f = fixture("NONE", "clinic.Concept", "");
        assert!(!monitored(&f, "clinic.Concept"));
    }

    #[test]
    fn test_all_monitors_every_auditable_type() {
        let f = fixture("ALL", "", "");
        assert!(monitored(&f, "clinic.Concept"));
        assert!(monitored(&f, "clinic.EncounterType"));
        assert!(!monitored(&f, "clinic.Setting"));
        assert!(!monitored(&f, "clinic.NotMapped"));
    }

    #[test]
    fn test_none_except() {
        let f = fixture("NONE_EXCEPT", "clinic.Concept", "");
        assert!(monitored(&f, "clinic.Concept"));
        assert!(monitored(&f, "clinic.ConceptNumeric"));
        // Owned through Concept.names
        assert!(monitored(&f, "clinic.ConceptName"));
        assert!(monitored(&f, "clinic.ConceptNameTag"));
        assert!(!monitored(&f, "clinic.Location"));
        assert!(!monitored(&f, "clinic.ConceptClass"));
    }

    #[test]
    fn test_all_except() {
        let f = fixture("ALL_EXCEPT", "", "clinic.EncounterType,clinic.Concept");
        assert!(!monitored(&f, "clinic.EncounterType"));
        assert!(!monitored(&f, "clinic.Concept"));
        assert!(!monitored(&f, "clinic.ConceptNumeric"));
        assert!(monitored(&f, "clinic.Location"));
    }

    #[test]
    fn test_all_except_self_owning_type_stays_monitored() {
        // Location.childLocations owns Location, so excluding it has no effect
        let f = fixture("ALL_EXCEPT", "", "clinic.Location");
        assert!(f.resolver.cache().implicit_monitored().contains_name("clinic.Location"));
        assert!(monitored(&f, "clinic.Location"));
    }

    #[test]
    fn test_none_except_self_owning_type_not_implicit() {
        let f = fixture("NONE_EXCEPT", "clinic.Location", "");
        assert!(monitored(&f, "clinic.Location"));
        assert!(!f.resolver.cache().implicit_monitored().contains_name("clinic.Location"));
    }

    #[test]
    fn test_all_except_implicit_overrides_unmonitored() {
        let f = fixture("ALL_EXCEPT", "", "clinic.ConceptName");
        // Concept owns ConceptName, so it stays audited
        assert!(monitored(&f, "clinic.ConceptName"));
    }

    #[test]
    fn test_none_except_does_not_override_omission() {
        let f = fixture("NONE_EXCEPT", "clinic.ConceptName", "");
        // ConceptName owns tags, but nothing makes Concept monitored
        assert!(monitored(&f, "clinic.ConceptNameTag"));
        assert!(!monitored(&f, "clinic.Concept"));
    }

    #[test]
    fn test_strategy_switch_takes_effect_on_next_check() {
        let f = fixture("NONE_EXCEPT", "clinic.Concept", "");
        assert!(!monitored(&f, "clinic.Location"));

        f.store.set_value(keys::MONITORING_STRATEGY, "ALL").unwrap();
        assert!(monitored(&f, "clinic.Location"));
        assert!(monitored(&f, "clinic.PatientIdentifierType"));
    }

    #[test]
    fn test_late_subclass_monitored_under_all_after_invalidation() {
        let f = fixture("ALL", "", "");
        assert!(!monitored(&f, "clinic.ConceptCoded"));

        f.registry
            .register(TypeDescriptor::new("clinic.ConceptCoded").extends("clinic.Concept").not_auditable());
        f.resolver
            .cache()
            .invalidate(crate::policy::InvalidationScope::All);
        // Auditable through Concept's capability marker
        assert!(monitored(&f, "clinic.ConceptCoded"));
    }

    #[test]
    fn test_expand_filter() {
        let f = fixture("ALL", "", "");
        assert!(f.resolver.expand_filter(None).is_none());

        let expanded = f
            .resolver
            .expand_filter(Some(&[TypeName::from("clinic.Concept")]))
            .unwrap();
        let names: Vec<&str> = expanded.iter().map(TypeName::as_str).collect();
        assert_eq!(
            names,
            vec!["clinic.Concept", "clinic.ConceptComplex", "clinic.ConceptNumeric"]
        );

        let expanded = f
            .resolver
            .expand_filter(Some(&[TypeName::from("clinic.Setting")]))
            .unwrap();
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_expand_filter_sees_late_subclass() {
        let f = fixture("ALL", "", "");
        f.registry
            .register(TypeDescriptor::new("clinic.ConceptCoded").extends("clinic.Concept"));

        let expanded = f
            .resolver
            .expand_filter(Some(&[TypeName::from("clinic.Concept")]))
            .unwrap();
        assert!(expanded.contains_name("clinic.ConceptCoded"));
    }
}
