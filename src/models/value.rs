//! Property values and entity snapshots
//!
//! The host hands over an entity's persistent state as a map from property
//! name to `PropertyValue`, captured immediately before and after a write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::type_name::TypeName;

/// Prefix used when rendering an object reference as a display string
pub const REFERENCE_LABEL: &str = "ref:";

/// Snapshot of an entity's persistent state
pub type PropertyState = BTreeMap<String, PropertyValue>;

/// A reference to another entity, compared by its stable identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub type_name: TypeName,
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl EntityRef {
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

    /// `ref:<uuid>` label used in change sets
    pub fn label(&self) -> String {
        format!("{}{}", REFERENCE_LABEL, self.uuid)
    }
}

/// A single property value in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Reference(EntityRef),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render the value the way it appears in a change set
    ///
    /// Returns `None` for null so the change set can omit that side.
    pub fn display_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Decimal(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Reference(r) => f.write_str(&r.label()),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<EntityRef> for PropertyValue {
    fn from(r: EntityRef) -> Self {
        Self::Reference(r)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_label() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let reference = EntityRef::new("org.example.ConceptClass", uuid);
        assert_eq!(
            PropertyValue::from(reference).display_string().unwrap(),
            "ref:550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_null_has_no_display_string() {
        assert!(PropertyValue::Null.display_string().is_none());
        assert_eq!(
            PropertyValue::from(None::<String>),
            PropertyValue::Null
        );
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(PropertyValue::from(42).to_string(), "42");
        assert_eq!(PropertyValue::from(true).to_string(), "true");
        assert_eq!(
            PropertyValue::List(vec![1.into(), 2.into()]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_serde_tagged_form() {
        let value = PropertyValue::text("1.1");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"text","value":"1.1"}"#);
        let back: PropertyValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);

        let null: PropertyValue = serde_json::from_str(r#"{"kind":"null"}"#).unwrap();
        assert!(null.is_null());
    }
}
