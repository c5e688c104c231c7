//! Append-only audit log
//!
//! Records are written to `audit.log` as line-delimited JSON (one record per
//! line, flushed immediately) and kept in memory for querying.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use super::file_io::{append_json_lines, read_json_lines};

use crate::audit::{AuditRecord, AuditRepository, RecordQuery};
use crate::error::AuditResult;
use crate::models::AuditRecordId;

/// File-backed audit repository
pub struct AuditLogRepository {
    log_path: Option<PathBuf>,
    records: RwLock<Vec<AuditRecord>>,
}

impl AuditLogRepository {
    /// Open the log at `log_path`, reading any records already there
    pub fn open(log_path: PathBuf) -> AuditResult<Self> {
        let records: Vec<AuditRecord> = read_json_lines(&log_path)?;
        debug!(path = %log_path.display(), count = records.len(), "audit log loaded");
        Ok(Self {
            log_path: Some(log_path),
            records: RwLock::new(records),
        })
    }

    /// A repository that keeps records in memory only
    pub fn in_memory() -> Self {
        Self {
            log_path: None,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn append(&self, records: &[AuditRecord]) -> AuditResult<()> {
        match &self.log_path {
            Some(log_path) => append_json_lines(log_path, records),
            None => Ok(()),
        }
    }
}

impl AuditRepository for AuditLogRepository {
    fn insert(&self, record: AuditRecord) -> AuditResult<()> {
        self.insert_all(vec![record])
    }

    /// Writes all records and flushes once; memory is only updated once the
    /// file write succeeded
    fn insert_all(&self, records: Vec<AuditRecord>) -> AuditResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut stored = self.records.write();
        self.append(&records)?;
        stored.extend(records);
        Ok(())
    }

    fn query(&self, query: &RecordQuery) -> AuditResult<Vec<AuditRecord>> {
        Ok(query.apply(self.records.read().iter()))
    }

    fn get(&self, id: &AuditRecordId) -> AuditResult<Option<AuditRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| r.uuid() == *id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Action, ChangeSet};
    use crate::error::AuditError;
    use crate::models::AuditSubject;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_repository() -> (AuditLogRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let repository = AuditLogRepository::open(log_path).unwrap();
        (repository, temp_dir)
    }

    fn create_test_record(action: Action) -> AuditRecord {
        let mut changes = ChangeSet::new();
        if action == Action::Updated {
            changes.insert("version", Some("1".into()), Some("2".into()));
        }
        AuditRecord::new(
            action,
            &AuditSubject::new("clinic.Concept", Uuid::new_v4()),
            changes,
            "admin",
        )
    }

    #[test]
    fn test_insert_and_get() {
        let (repository, _temp) = create_test_repository();
        let record = create_test_record(Action::Created);

        repository.insert(record.clone()).unwrap();

        assert_eq!(repository.len(), 1);
        assert_eq!(repository.get(&record.uuid()).unwrap(), Some(record));
        assert!(repository.get(&AuditRecordId::new()).unwrap().is_none());
    }

    #[test]
    fn test_insert_all() {
        let (repository, _temp) = create_test_repository();

        let records: Vec<AuditRecord> = (0..3).map(|_| create_test_record(Action::Deleted)).collect();
        repository.insert_all(records).unwrap();

        assert_eq!(repository.query(&RecordQuery::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_empty_log() {
        let (repository, _temp) = create_test_repository();

        assert!(repository.is_empty());
        assert!(!repository.path().unwrap().exists());
        assert!(repository.query(&RecordQuery::new()).unwrap().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let (repository, temp) = create_test_repository();
        let record = create_test_record(Action::Updated);
        repository.insert(record.clone()).unwrap();

        let reopened = AuditLogRepository::open(temp.path().join("audit.log")).unwrap();
        let loaded = reopened.get(&record.uuid()).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.changes().len(), 1);
    }

    #[test]
    fn test_one_line_per_record() {
        let (repository, temp) = create_test_repository();
        repository.insert(create_test_record(Action::Created)).unwrap();
        repository.insert(create_test_record(Action::Updated)).unwrap();

        let content = std::fs::read_to_string(temp.path().join("audit.log")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        std::fs::write(&log_path, "{not a record}\n").unwrap();

        let err = AuditLogRepository::open(log_path).err().unwrap();
        assert!(matches!(err, AuditError::Json(_)));
    }

    #[test]
    fn test_failed_append_keeps_memory_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        // A directory in place of the log file cannot be opened for append
        let log_path = temp_dir.path().join("audit.log");
        std::fs::create_dir(&log_path).unwrap();
        let repository = AuditLogRepository {
            log_path: Some(log_path),
            records: RwLock::new(Vec::new()),
        };

        let err = repository
            .insert(create_test_record(Action::Created))
            .unwrap_err();
        assert!(err.is_persistence());
        assert!(repository.is_empty());
    }

    #[test]
    fn test_in_memory() {
        let repository = AuditLogRepository::in_memory();
        repository.insert(create_test_record(Action::Created)).unwrap();
        assert!(repository.path().is_none());
        assert_eq!(repository.len(), 1);
    }
}
