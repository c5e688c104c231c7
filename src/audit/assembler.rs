//! Record assembly from lifecycle events

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::models::{AuditSubject, EntityRef, PropertyState};
use crate::policy::MonitoringPolicyResolver;

use super::changes::ChangeSet;
use super::diff::ChangeCaptureEngine;
use super::entry::{Action, AuditRecord};

/// Turns lifecycle events into audit records for monitored types
#[derive(Clone)]
pub struct AuditRecordAssembler {
    resolver: Arc<MonitoringPolicyResolver>,
    engine: Arc<ChangeCaptureEngine>,
}

impl AuditRecordAssembler {
    pub fn new(resolver: Arc<MonitoringPolicyResolver>, engine: Arc<ChangeCaptureEngine>) -> Self {
        Self { resolver, engine }
    }

    pub fn on_create(&self, entity: &AuditSubject, creator: &str) -> Option<AuditRecord> {
        self.lifecycle_record(Action::Created, entity, creator)
    }

    pub fn on_delete(&self, entity: &AuditSubject, creator: &str) -> Option<AuditRecord> {
        self.lifecycle_record(Action::Deleted, entity, creator)
    }

    /// `None` when the type is not monitored or nothing changed
    pub fn on_update(
        &self,
        entity: &AuditSubject,
        previous: &PropertyState,
        new: &PropertyState,
        creator: &str,
    ) -> Option<AuditRecord> {
        if !self.resolver.is_monitored(&entity.type_name) {
            return None;
        }

        let changes = self.engine.capture(&entity.type_name, previous, new);
        if changes.is_empty() {
            debug!(type_name = %entity.type_name, uuid = %entity.uuid, "update without changes");
            return None;
        }

        Some(self.emit(Action::Updated, entity, changes, creator))
    }

    /// An owned collection of `owner` changed membership
    ///
    /// Members compare by uuid; each side renders as a sorted list of
    /// `ref:<uuid>` labels, and an empty collection renders as null.
    pub fn on_collection_update(
        &self,
        owner: &AuditSubject,
        property: &str,
        previous_items: &[EntityRef],
        new_items: &[EntityRef],
        creator: &str,
    ) -> Option<AuditRecord> {
        if !self.resolver.is_monitored(&owner.type_name) {
            return None;
        }

        let before = member_labels(previous_items);
        let after = member_labels(new_items);
        if before == after {
            return None;
        }

        let mut changes = ChangeSet::new();
        changes.insert(property, render_members(&before), render_members(&after));
        Some(self.emit(Action::Updated, owner, changes, creator))
    }

    fn lifecycle_record(
        &self,
        action: Action,
        entity: &AuditSubject,
        creator: &str,
    ) -> Option<AuditRecord> {
        if !self.resolver.is_monitored(&entity.type_name) {
            return None;
        }
        Some(self.emit(action, entity, ChangeSet::new(), creator))
    }

    fn emit(
        &self,
        action: Action,
        entity: &AuditSubject,
        changes: ChangeSet,
        creator: &str,
    ) -> AuditRecord {
        debug!(
            action = %action,
            type_name = %entity.type_name,
            uuid = %entity.uuid,
            changed = changes.len(),
            "audit record assembled"
        );
        AuditRecord::new(action, entity, changes, creator)
    }
}

fn member_labels(items: &[EntityRef]) -> BTreeSet<String> {
    items.iter().map(EntityRef::label).collect()
}

fn render_members(labels: &BTreeSet<String>) -> Option<String> {
    if labels.is_empty() {
        return None;
    }
    Some(format!(
        "[{}]",
        labels.iter().cloned().collect::<Vec<_>>().join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, ConfigStore};
    use crate::models::PropertyValue;
    use crate::policy::PolicyCache;
    use crate::schema::{TypeGraphIndex, TypeRegistry};
    use crate::storage::init::demo_schema;
    use crate::storage::PropertyStore;
    use uuid::Uuid;

    fn assembler(strategy: &str, monitored: &str) -> AuditRecordAssembler {
        let store = Arc::new(PropertyStore::in_memory());
        store.set_value(keys::MONITORING_STRATEGY, strategy).unwrap();
        store.set_value(keys::MONITORED_CLASSES, monitored).unwrap();

        let graph = TypeGraphIndex::new(Arc::new(TypeRegistry::from_descriptors(demo_schema())));
        let cache = Arc::new(PolicyCache::new(store, graph.clone()));
        let resolver = Arc::new(MonitoringPolicyResolver::new(cache, graph.clone()));
        AuditRecordAssembler::new(resolver, Arc::new(ChangeCaptureEngine::new(graph)))
    }

    fn concept() -> AuditSubject {
        AuditSubject::new("clinic.Concept", Uuid::new_v4()).with_id(1)
    }

    fn version(v: &str) -> PropertyState {
        [("version".to_string(), PropertyValue::text(v))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_create_and_delete_of_monitored_type() {
        let assembler = assembler("NONE_EXCEPT", "clinic.Concept");
        let entity = concept();

        let created = assembler.on_create(&entity, "admin").unwrap();
        assert_eq!(created.action(), Action::Created);
        assert!(created.changes().is_empty());
        assert_eq!(created.subject_uuid(), entity.uuid);

        let deleted = assembler.on_delete(&entity, "admin").unwrap();
        assert_eq!(deleted.action(), Action::Deleted);
    }

    #[test]
    fn test_unmonitored_type_yields_nothing() {
        let assembler = assembler("NONE_EXCEPT", "clinic.Concept");
        let location = AuditSubject::new("clinic.Location", Uuid::new_v4());

        assert!(assembler.on_create(&location, "admin").is_none());
        assert!(assembler
            .on_update(&location, &PropertyState::new(), &version("2"), "admin")
            .is_none());
    }

    #[test]
    fn test_update_records_changes() {
        let assembler = assembler("ALL", "");
        let record = assembler
            .on_update(&concept(), &version("1"), &version("2"), "admin")
            .unwrap();

        assert_eq!(record.action(), Action::Updated);
        assert_eq!(record.changes().len(), 1);
        assert_eq!(record.creator(), "admin");
    }

    #[test]
    fn test_noop_update_yields_nothing() {
        let assembler = assembler("ALL", "");
        assert!(assembler
            .on_update(&concept(), &version("Same"), &version("same"), "admin")
            .is_none());
    }

    #[test]
    fn test_collection_update() {
        let assembler = assembler("ALL", "");
        let a = EntityRef::new("clinic.ConceptName", Uuid::from_u128(1));
        let b = EntityRef::new("clinic.ConceptName", Uuid::from_u128(2));

        // Reordering is not a change
        assert!(assembler
            .on_collection_update(&concept(), "names", &[a.clone(), b.clone()], &[b.clone(), a.clone()], "admin")
            .is_none());

        let record = assembler
            .on_collection_update(&concept(), "names", &[], &[b.clone(), a.clone()], "admin")
            .unwrap();
        let change = record.changes().get("names").unwrap();
        assert!(change.previous.is_none());
        assert_eq!(change.new, Some(format!("[{}, {}]", a.label(), b.label())));
    }
}
