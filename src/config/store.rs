//! Key-value configuration store contract
//!
//! The monitoring policy reads its strategy and type lists from a versioned
//! key-value store and listens for changes to them on a channel.

use std::sync::mpsc::Receiver;

use crate::error::AuditResult;

/// A change pushed by the store to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEvent {
    pub key: String,
    /// New value, `None` when the key was deleted
    pub value: Option<String>,
}

impl ConfigEvent {
    pub fn changed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// Versioned key-value store
pub trait ConfigStore: Send + Sync {
    fn get_value(&self, key: &str) -> AuditResult<Option<String>>;

    /// Store a value and notify subscribers
    fn set_value(&self, key: &str, value: &str) -> AuditResult<()>;

    /// Remove a key and notify subscribers; removing a missing key is not an
    /// error
    fn delete_value(&self, key: &str) -> AuditResult<()>;

    /// Register for change notifications
    fn subscribe(&self) -> Receiver<ConfigEvent>;
}
