//! Change sets
//!
//! A change set maps property names to their `(previous, new)` display
//! strings. Its external form is a JSON document:
//!
//! ```json
//! {"changes": [{"property": "version", "previous": "1.0", "new": "1.1"}]}
//! ```
//!
//! A missing `previous` or `new` means that side was null.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuditError, AuditResult};

/// Previous and new display values of one property
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyChange {
    pub previous: Option<String>,
    pub new: Option<String>,
}

impl PropertyChange {
    pub fn new(previous: Option<String>, new: Option<String>) -> Self {
        Self { previous, new }
    }
}

/// One `property` node of the change document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new: Option<String>,
}

/// Root of the change document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChangeDocument {
    #[serde(default)]
    changes: Vec<ChangeEntry>,
}

/// Per-property diff of one entity across a single write, ordered by
/// property name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ChangeEntry>", into = "Vec<ChangeEntry>")]
pub struct ChangeSet {
    entries: BTreeMap<String, PropertyChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change; a change with both sides null is not a change and
    /// is dropped. Returns whether the entry was kept.
    pub fn insert(
        &mut self,
        property: impl Into<String>,
        previous: Option<String>,
        new: Option<String>,
    ) -> bool {
        if previous.is_none() && new.is_none() {
            return false;
        }
        self.entries
            .insert(property.into(), PropertyChange::new(previous, new));
        true
    }

    pub fn get(&self, property: &str) -> Option<&PropertyChange> {
        self.entries.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.entries.contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyChange)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Serialize to the change document
    pub fn to_document(&self) -> AuditResult<String> {
        let document = ChangeDocument {
            changes: self.clone().into(),
        };
        serde_json::to_string(&document)
            .map_err(|e| AuditError::Json(format!("Failed to serialize changes: {}", e)))
    }

    /// Parse a change document
    pub fn from_document(document: &str) -> AuditResult<Self> {
        let parsed: ChangeDocument = serde_json::from_str(document)
            .map_err(|e| AuditError::Json(format!("Invalid changes document: {}", e)))?;
        Ok(parsed.changes.into())
    }

    /// One line per property: `name: previous -> new`
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(name, change)| {
                format!(
                    "{}: {} -> {}",
                    name,
                    change.previous.as_deref().unwrap_or("(none)"),
                    change.new.as_deref().unwrap_or("(none)")
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Vec<ChangeEntry>> for ChangeSet {
    fn from(entries: Vec<ChangeEntry>) -> Self {
        let mut set = ChangeSet::new();
        for entry in entries {
            if set.contains(&entry.property) {
                warn!(property = %entry.property, "duplicate property in changes document");
            }
            set.insert(entry.property, entry.previous, entry.new);
        }
        set
    }
}

impl From<ChangeSet> for Vec<ChangeEntry> {
    fn from(set: ChangeSet) -> Self {
        set.entries
            .into_iter()
            .map(|(property, change)| ChangeEntry {
                property,
                previous: change.previous,
                new: change.new,
            })
            .collect()
    }
}
