//! Audit record data structures
//!
//! Defines the action types and the immutable record the assembler builds
//! for each qualifying entity change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuditError;
use crate::models::{AuditRecordId, AuditSubject, TypeName};

use super::changes::ChangeSet;

/// Types of changes that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Entity was created
    Created,
    /// Entity was updated
    Updated,
    /// Entity was deleted
    Deleted,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[Action::Created, Action::Updated, Action::Deleted]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "CREATED",
            Action::Updated => "UPDATED",
            Action::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREATED" | "CREATE" => Ok(Action::Created),
            "UPDATED" | "UPDATE" => Ok(Action::Updated),
            "DELETED" | "DELETE" => Ok(Action::Deleted),
            other => Err(AuditError::Validation(format!(
                "Unknown action '{}'. Valid actions: CREATED, UPDATED, DELETED",
                other
            ))),
        }
    }
}

/// A single audit record
///
/// Built once by the assembler and never mutated afterwards; the fields are
/// only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    uuid: AuditRecordId,
    action: Action,
    subject_type: TypeName,
    subject_uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_id: Option<i64>,
    #[serde(default, skip_serializing_if = "ChangeSet::is_empty")]
    changes: ChangeSet,
    created_at: DateTime<Utc>,
    creator: String,
}

impl AuditRecord {
    /// Create a record stamped with the current time
    pub fn new(
        action: Action,
        subject: &AuditSubject,
        changes: ChangeSet,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            uuid: AuditRecordId::new(),
            action,
            subject_type: subject.type_name.clone(),
            subject_uuid: subject.uuid,
            subject_id: subject.id,
            changes,
            created_at: Utc::now(),
            creator: creator.into(),
        }
    }

    /// Override the creation time, for records replayed from elsewhere
    pub fn created_at_time(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn uuid(&self) -> AuditRecordId {
        self.uuid
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn subject_type(&self) -> &TypeName {
        &self.subject_type
    }

    pub fn subject_uuid(&self) -> Uuid {
        self.subject_uuid
    }

    pub fn subject_id(&self) -> Option<i64> {
        self.subject_id
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {} by {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.subject_type,
            self.subject_uuid,
            self.creator
        );

        if !self.changes.is_empty() {
            output.push_str(&format!("\n  Changes: {}", self.changes.summary()));
        }

        output
    }
}
