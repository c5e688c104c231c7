//! Unit of work for audit records
//!
//! Records assembled while a host write is pending are held here and only
//! reach the repository on `commit`. A rollback (explicit or by drop)
//! discards them together with the write they describe.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::AuditResult;
use crate::models::{AuditSubject, EntityRef, PropertyState};

use super::assembler::AuditRecordAssembler;
use super::entry::AuditRecord;
use super::repository::AuditRepository;

/// Pending audit records of one host transaction
pub struct AuditTransaction {
    assembler: AuditRecordAssembler,
    repository: Arc<dyn AuditRepository>,
    creator: String,
    pending: Vec<AuditRecord>,
}

impl AuditTransaction {
    pub fn new(
        assembler: AuditRecordAssembler,
        repository: Arc<dyn AuditRepository>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            assembler,
            repository,
            creator: creator.into(),
            pending: Vec::new(),
        }
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Records queued so far
    pub fn pending(&self) -> &[AuditRecord] {
        &self.pending
    }

    /// Returns true if a record was queued
    pub fn record_create(&mut self, entity: &AuditSubject) -> bool {
        let record = self.assembler.on_create(entity, &self.creator);
        self.queue(record)
    }

    pub fn record_update(
        &mut self,
        entity: &AuditSubject,
        previous: &PropertyState,
        new: &PropertyState,
    ) -> bool {
        let record = self
            .assembler
            .on_update(entity, previous, new, &self.creator);
        self.queue(record)
    }

    pub fn record_delete(&mut self, entity: &AuditSubject) -> bool {
        let record = self.assembler.on_delete(entity, &self.creator);
        self.queue(record)
    }

    pub fn record_collection_update(
        &mut self,
        owner: &AuditSubject,
        property: &str,
        previous_items: &[EntityRef],
        new_items: &[EntityRef],
    ) -> bool {
        let record = self.assembler.on_collection_update(
            owner,
            property,
            previous_items,
            new_items,
            &self.creator,
        );
        self.queue(record)
    }

    fn queue(&mut self, record: Option<AuditRecord>) -> bool {
        match record {
            Some(record) => {
                self.pending.push(record);
                true
            }
            None => false,
        }
    }

    /// Hand every pending record to the repository, returning how many were
    /// written
    pub fn commit(mut self) -> AuditResult<usize> {
        let records = std::mem::take(&mut self.pending);
        let count = records.len();
        if count == 0 {
            return Ok(0);
        }

        self.repository.insert_all(records).map_err(|e| {
            error!(error = %e, count, "failed to store audit records");
            e
        })?;
        debug!(count, creator = %self.creator, "audit transaction committed");
        Ok(count)
    }

    /// Discard every pending record, returning how many were dropped
    pub fn rollback(mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        debug!(count, "audit transaction rolled back");
        count
    }
}

impl Drop for AuditTransaction {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                count = self.pending.len(),
                "audit transaction dropped without commit, discarding records"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Action, ChangeCaptureEngine, RecordQuery};
    use crate::config::{keys, ConfigStore};
    use crate::error::AuditError;
    use crate::models::AuditRecordId;
    use crate::policy::{MonitoringPolicyResolver, PolicyCache};
    use crate::schema::{TypeGraphIndex, TypeRegistry};
    use crate::storage::init::demo_schema;
    use crate::storage::{AuditLogRepository, PropertyStore};
    use uuid::Uuid;

    fn assembler() -> AuditRecordAssembler {
        let store = Arc::new(PropertyStore::in_memory());
        store.set_value(keys::MONITORING_STRATEGY, "ALL").unwrap();
        let graph = TypeGraphIndex::new(Arc::new(TypeRegistry::from_descriptors(demo_schema())));
        let cache = Arc::new(PolicyCache::new(store, graph.clone()));
        AuditRecordAssembler::new(
            Arc::new(MonitoringPolicyResolver::new(cache, graph.clone())),
            Arc::new(ChangeCaptureEngine::new(graph)),
        )
    }

    fn concept() -> AuditSubject {
        AuditSubject::new("clinic.Concept", Uuid::new_v4())
    }

    #[test]
    fn test_commit_inserts_pending_records() {
        let repository = Arc::new(AuditLogRepository::in_memory());
        let mut tx = AuditTransaction::new(assembler(), repository.clone(), "admin");

        assert!(tx.record_create(&concept()));
        assert!(tx.record_delete(&concept()));
        assert!(!tx.record_create(&AuditSubject::new("clinic.Setting", Uuid::new_v4())));
        assert_eq!(tx.pending().len(), 2);
        assert!(repository.query(&RecordQuery::new()).unwrap().is_empty());

        assert_eq!(tx.commit().unwrap(), 2);
        let stored = repository.query(&RecordQuery::new()).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.creator() == "admin"));
    }

    #[test]
    fn test_rollback_discards() {
        let repository = Arc::new(AuditLogRepository::in_memory());
        let mut tx = AuditTransaction::new(assembler(), repository.clone(), "admin");
        tx.record_create(&concept());

        assert_eq!(tx.rollback(), 1);
        assert!(repository.query(&RecordQuery::new()).unwrap().is_empty());
    }

    #[test]
    fn test_drop_discards() {
        let repository = Arc::new(AuditLogRepository::in_memory());
        {
            let mut tx = AuditTransaction::new(assembler(), repository.clone(), "admin");
            tx.record_create(&concept());
        }
        assert!(repository.query(&RecordQuery::new()).unwrap().is_empty());
    }

    struct FailingRepository;

    impl AuditRepository for FailingRepository {
        fn insert(&self, _record: AuditRecord) -> AuditResult<()> {
            Err(AuditError::Persistence("disk full".into()))
        }

        fn insert_all(&self, _records: Vec<AuditRecord>) -> AuditResult<()> {
            Err(AuditError::Persistence("disk full".into()))
        }

        fn query(&self, _query: &RecordQuery) -> AuditResult<Vec<AuditRecord>> {
            Ok(Vec::new())
        }

        fn get(&self, _id: &AuditRecordId) -> AuditResult<Option<AuditRecord>> {
            Ok(None)
        }
    }

    #[test]
    fn test_commit_failure_is_returned() {
        let mut tx = AuditTransaction::new(assembler(), Arc::new(FailingRepository), "admin");
        tx.record_create(&concept());

        let err = tx.commit().unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn test_empty_commit_skips_repository() {
        let tx = AuditTransaction::new(assembler(), Arc::new(FailingRepository), "admin");
        assert_eq!(tx.commit().unwrap(), 0);
    }

    #[test]
    fn test_update_without_changes_queues_nothing() {
        let repository = Arc::new(AuditLogRepository::in_memory());
        let mut tx = AuditTransaction::new(assembler(), repository, "admin");
        let state = PropertyState::new();
        assert!(!tx.record_update(&concept(), &state, &state));
        assert!(tx.pending().iter().all(|r| r.action() != Action::Updated));
    }
}
