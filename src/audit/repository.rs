//! Audit repository contract
//!
//! Where finished records go, and the filter they are read back with.

use chrono::{DateTime, Utc};

use crate::error::AuditResult;
use crate::models::{AuditRecordId, TypeSet};

use super::entry::{Action, AuditRecord};

/// Filter and page for reading records back
///
/// Every field is optional; an empty query returns everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// Subject types to include, already expanded with subclasses
    pub types: Option<TypeSet>,
    pub actions: Option<Vec<Action>>,
    /// Inclusive lower bound on creation time
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    pub end: Option<DateTime<Utc>>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(mut self, types: TypeSet) -> Self {
        self.types = Some(types);
        self
    }

    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Whether a record passes the filters (paging not applied)
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(types) = &self.types {
            if !types.contains(record.subject_type()) {
                return false;
            }
        }
        if let Some(actions) = &self.actions {
            if !actions.is_empty() && !actions.contains(&record.action()) {
                return false;
            }
        }
        if self.start.is_some_and(|start| record.created_at() < start) {
            return false;
        }
        if self.end.is_some_and(|end| record.created_at() > end) {
            return false;
        }
        true
    }

    /// Filter, order newest first and page a set of records
    ///
    /// Records with equal timestamps keep reverse insertion order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<AuditRecord>
    where
        I: DoubleEndedIterator<Item = &'a AuditRecord>,
    {
        let mut matching: Vec<&AuditRecord> = records.rev().filter(|r| self.matches(r)).collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        matching
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Durable store for audit records
pub trait AuditRepository: Send + Sync {
    fn insert(&self, record: AuditRecord) -> AuditResult<()>;

    /// Insert several records as one write
    fn insert_all(&self, records: Vec<AuditRecord>) -> AuditResult<()>;

    /// Matching records, newest first
    fn query(&self, query: &RecordQuery) -> AuditResult<Vec<AuditRecord>>;

    fn get(&self, id: &AuditRecordId) -> AuditResult<Option<AuditRecord>>;
}
