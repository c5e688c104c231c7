//! The entity a lifecycle event is about

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::type_name::TypeName;
use super::value::EntityRef;

/// Identity of an entity passed to the lifecycle hooks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditSubject {
    /// Concrete type of the entity
    pub type_name: TypeName,
    /// Stable identifier
    pub uuid: Uuid,
    /// Surrogate (database) identifier, unknown until the row is flushed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl AuditSubject {
    pub fn new(type_name: impl Into<TypeName>, uuid: Uuid) -> Self {
        Self {
            type_name: type_name.into(),
            uuid,
            id: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// A reference to this entity, as other entities would hold it
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            type_name: self.type_name.clone(),
            uuid: self.uuid,
            id: self.id,
        }
    }
}
