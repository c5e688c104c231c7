//! Key-value property store
//!
//! Versioned string properties kept in `properties.json` (or only in memory),
//! with change notifications fanned out to subscribers over channels.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::keys;
use crate::config::{ConfigEvent, ConfigStore};
use crate::error::{AuditError, AuditResult};

use super::file_io::{read_json, write_json_atomic};

/// A stored property value with its version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub value: String,
    /// Incremented on every change, starting at 1
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Serializable property data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PropertyData {
    properties: BTreeMap<String, PropertyEntry>,
}

/// Versioned key-value store with change notification
pub struct PropertyStore {
    path: Option<PathBuf>,
    data: RwLock<BTreeMap<String, PropertyEntry>>,
    subscribers: Mutex<Vec<Sender<ConfigEvent>>>,
}

impl PropertyStore {
    /// Open a file-backed store, loading existing properties
    pub fn open(path: PathBuf) -> AuditResult<Self> {
        let file_data: PropertyData = read_json(&path)?;
        Ok(Self {
            path: Some(path),
            data: RwLock::new(file_data.properties),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Get a property with its version information
    pub fn entry(&self, key: &str) -> Option<PropertyEntry> {
        self.data.read().get(key).cloned()
    }

    /// All properties sorted by key
    pub fn entries(&self) -> Vec<(String, PropertyEntry)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn persist(&self, properties: &BTreeMap<String, PropertyEntry>) -> AuditResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file_data = PropertyData {
            properties: properties.clone(),
        };
        write_json_atomic(path, &file_data)
            .map_err(|e| AuditError::Persistence(format!("Failed to save properties: {}", e)))
    }

    fn notify(&self, event: ConfigEvent) {
        debug!(key = %event.key, deleted = event.is_delete(), "property changed");
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

impl ConfigStore for PropertyStore {
    fn get_value(&self, key: &str) -> AuditResult<Option<String>> {
        Ok(self.data.read().get(key).map(|entry| entry.value.clone()))
    }

    fn set_value(&self, key: &str, value: &str) -> AuditResult<()> {
        {
            let mut data = self.data.write();
            if data.get(key).is_some_and(|entry| entry.value == value) {
                return Ok(());
            }

            let mut updated = data.clone();
            let previous = updated.get(key);
            let entry = PropertyEntry {
                value: value.to_string(),
                version: previous.map_or(1, |p| p.version + 1),
                updated_at: Utc::now(),
                description: previous
                    .and_then(|p| p.description.clone())
                    .or_else(|| keys::description(key).map(str::to_string)),
            };
            updated.insert(key.to_string(), entry);

            // Memory only changes once the file write succeeded
            self.persist(&updated)?;
            *data = updated;
        }

        self.notify(ConfigEvent::changed(key, value));
        Ok(())
    }

    fn delete_value(&self, key: &str) -> AuditResult<()> {
        {
            let mut data = self.data.write();
            if !data.contains_key(key) {
                return Ok(());
            }
            let mut updated = data.clone();
            updated.remove(key);
            self.persist(&updated)?;
            *data = updated;
        }

        self.notify(ConfigEvent::deleted(key));
        Ok(())
    }

    fn subscribe(&self) -> Receiver<ConfigEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }
}
