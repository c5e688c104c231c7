//! Change capture
//!
//! Diffs an entity's state before and after a write into a `ChangeSet`,
//! ignoring differences nobody would call a change: empty vs. missing text,
//! letter case, and reference identity (references compare by uuid).

use std::collections::{BTreeSet, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::config::settings::DEFAULT_IGNORED_PROPERTIES;
use crate::models::{PropertyState, PropertyValue, TypeName};
use crate::schema::TypeGraphIndex;

use super::changes::ChangeSet;

/// A value reduced to what matters for equality
#[derive(Debug)]
enum Normalized<'a> {
    Absent,
    Text(String),
    Reference(Uuid),
    Other(&'a PropertyValue),
}

impl<'a> Normalized<'a> {
    fn of(value: Option<&'a PropertyValue>) -> Self {
        match value {
            None | Some(PropertyValue::Null) => Normalized::Absent,
            Some(PropertyValue::Text(s)) if s.is_empty() => Normalized::Absent,
            Some(PropertyValue::Text(s)) => Normalized::Text(s.to_lowercase()),
            Some(PropertyValue::Reference(r)) => Normalized::Reference(r.uuid),
            Some(other) => Normalized::Other(other),
        }
    }

    fn same_as(&self, other: &Normalized<'_>) -> bool {
        match (self, other) {
            (Normalized::Absent, Normalized::Absent) => true,
            (Normalized::Text(a), Normalized::Text(b)) => a == b,
            (Normalized::Reference(a), Normalized::Reference(b)) => a == b,
            (Normalized::Other(a), Normalized::Other(b)) => scalar_eq(a, b),
            _ => false,
        }
    }
}

fn scalar_eq(a: &PropertyValue, b: &PropertyValue) -> bool {
    match (a, b) {
        (PropertyValue::Decimal(x), PropertyValue::Decimal(y)) => {
            x == y || (x.is_nan() && y.is_nan())
        }
        _ => a == b,
    }
}

/// Computes change sets from before/after snapshots
#[derive(Clone)]
pub struct ChangeCaptureEngine {
    graph: TypeGraphIndex,
    ignored: HashSet<String>,
}

impl ChangeCaptureEngine {
    /// Engine with the default exclusion list
    pub fn new(graph: TypeGraphIndex) -> Self {
        Self {
            graph,
            ignored: DEFAULT_IGNORED_PROPERTIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the exclusion list
    pub fn with_ignored_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_ignored(&self, property: &str) -> bool {
        self.ignored.contains(property)
    }

    /// Diff two snapshots of an entity of the given type
    ///
    /// Only scalar and reference properties are compared; collections are
    /// left to `AuditRecordAssembler::on_collection_update`. If the type has
    /// no known properties, every key present in either snapshot is compared
    /// instead.
    pub fn capture(
        &self,
        type_name: &TypeName,
        previous: &PropertyState,
        new: &PropertyState,
    ) -> ChangeSet {
        let declared = self.graph.properties_of(type_name);

        let candidates: Vec<&str> = if declared.is_empty() {
            debug!(type_name = %type_name, "no property metadata, diffing snapshot keys");
            let keys: BTreeSet<&str> = previous
                .keys()
                .chain(new.keys())
                .map(String::as_str)
                .collect();
            keys.into_iter()
                .filter(|k| !is_list(previous.get(*k)) && !is_list(new.get(*k)))
                .collect()
        } else {
            declared
                .iter()
                .filter(|p| !p.kind.is_collection())
                .map(|p| p.name.as_str())
                .collect()
        };

        let mut changes = ChangeSet::new();
        for property in candidates {
            if self.is_ignored(property) {
                continue;
            }
            let before = previous.get(property);
            let after = new.get(property);
            if Normalized::of(before).same_as(&Normalized::of(after)) {
                continue;
            }
            changes.insert(
                property,
                before.and_then(PropertyValue::display_string),
                after.and_then(PropertyValue::display_string),
            );
        }

        changes
    }
}

fn is_list(value: Option<&PropertyValue>) -> bool {
    matches!(value, Some(PropertyValue::List(_)))
}
