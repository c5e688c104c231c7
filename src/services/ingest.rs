//! Event ingest service
//!
//! Replays host lifecycle events from a JSON Lines file through audit
//! transactions, the way an ORM integration would call the hooks. One event
//! per line:
//!
//! ```text
//! {"event":"create","subject":{"type_name":"clinic.Location","uuid":"..."}}
//! {"event":"update","subject":{...},"previous":{"name":"Ward A"},"new":{"name":"Ward B"}}
//! {"event":"collection","subject":{...},"property":"names","previous":[],"new":[{"type_name":"clinic.ConceptName","uuid":"..."}]}
//! {"event":"delete","subject":{...}}
//! {"event":"commit"}
//! {"event":"rollback"}
//! ```
//!
//! Snapshot values are plain JSON; objects are read as entity references.
//! Events after the last `commit` or `rollback` are committed at the end.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Deserialize;
use tracing::{debug, info};

use crate::audit::AuditTransaction;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditSubject, EntityRef, PropertyState, PropertyValue};
use crate::services::AuditLogService;

type JsonSnapshot = BTreeMap<String, serde_json::Value>;

/// One line of an ingest file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Create {
        subject: AuditSubject,
    },
    Update {
        subject: AuditSubject,
        #[serde(default)]
        previous: JsonSnapshot,
        #[serde(default)]
        new: JsonSnapshot,
    },
    Delete {
        subject: AuditSubject,
    },
    Collection {
        subject: AuditSubject,
        property: String,
        #[serde(default)]
        previous: Vec<EntityRef>,
        #[serde(default)]
        new: Vec<EntityRef>,
    },
    Commit,
    Rollback,
}

/// Summary of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestResult {
    pub events: usize,
    /// Records written, or that would have been on a dry run
    pub records: usize,
    /// Lifecycle events that produced no record
    pub skipped: usize,
    pub committed: usize,
    pub rolled_back: usize,
}

/// Convert a plain JSON value into a snapshot value
fn property_value(property: &str, value: serde_json::Value) -> AuditResult<PropertyValue> {
    use serde_json::Value;

    Ok(match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Boolean(b),
        Value::String(s) => PropertyValue::Text(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => PropertyValue::Integer(i),
            None => PropertyValue::Decimal(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Array(items) => PropertyValue::List(
            items
                .into_iter()
                .map(|item| property_value(property, item))
                .collect::<AuditResult<_>>()?,
        ),
        object @ Value::Object(_) => {
            let reference: EntityRef = serde_json::from_value(object).map_err(|e| {
                AuditError::Validation(format!(
                    "Property '{}' is not an entity reference: {}",
                    property, e
                ))
            })?;
            PropertyValue::Reference(reference)
        }
    })
}

fn snapshot(values: JsonSnapshot) -> AuditResult<PropertyState> {
    values
        .into_iter()
        .map(|(name, value)| {
            let value = property_value(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

/// Parse an ingest file, failing on the first malformed line
pub fn parse_events<R: BufRead>(reader: R) -> AuditResult<Vec<HostEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|e| {
            AuditError::Validation(format!("Line {}: {}", index + 1, e))
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Service for replaying host events
pub struct IngestService<'a> {
    service: &'a AuditLogService,
}

impl<'a> IngestService<'a> {
    pub fn new(service: &'a AuditLogService) -> Self {
        Self { service }
    }

    /// Replay events; with `dry_run` every transaction is rolled back
    pub fn replay(
        &self,
        events: Vec<HostEvent>,
        creator: Option<&str>,
        dry_run: bool,
    ) -> AuditResult<IngestResult> {
        let mut result = IngestResult::default();
        let mut current: Option<AuditTransaction> = None;

        for event in events {
            result.events += 1;
            match event {
                HostEvent::Commit => self.finish(current.take(), dry_run, &mut result)?,
                HostEvent::Rollback => {
                    if let Some(tx) = current.take() {
                        tx.rollback();
                        result.rolled_back += 1;
                    }
                }
                lifecycle => {
                    let tx = current.get_or_insert_with(|| self.service.begin(creator));
                    if !Self::apply(tx, lifecycle)? {
                        result.skipped += 1;
                    }
                }
            }
        }
        self.finish(current, dry_run, &mut result)?;

        info!(
            events = result.events,
            records = result.records,
            skipped = result.skipped,
            dry_run,
            "ingest finished"
        );
        Ok(result)
    }

    fn apply(tx: &mut AuditTransaction, event: HostEvent) -> AuditResult<bool> {
        let queued = match event {
            HostEvent::Create { subject } => tx.record_create(&subject),
            HostEvent::Delete { subject } => tx.record_delete(&subject),
            HostEvent::Update {
                subject,
                previous,
                new,
            } => tx.record_update(&subject, &snapshot(previous)?, &snapshot(new)?),
            HostEvent::Collection {
                subject,
                property,
                previous,
                new,
            } => tx.record_collection_update(&subject, &property, &previous, &new),
            HostEvent::Commit | HostEvent::Rollback => false,
        };
        Ok(queued)
    }

    fn finish(
        &self,
        tx: Option<AuditTransaction>,
        dry_run: bool,
        result: &mut IngestResult,
    ) -> AuditResult<()> {
        let Some(tx) = tx else {
            return Ok(());
        };

        if dry_run {
            result.records += tx.rollback();
            result.rolled_back += 1;
        } else {
            result.records += tx.commit()?;
            result.committed += 1;
        }
        debug!(records = result.records, "ingest transaction finished");
        Ok(())
    }
}
