//! Type and property descriptors
//!
//! The shape of the metadata the host exposes for each mapped type. These are
//! also the on-disk format of `schema.json`.

use serde::{Deserialize, Serialize};

use crate::models::TypeName;

/// How a property is mapped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    /// Plain column value (text, number, date, flag)
    Scalar,
    /// Many-to-one reference to another entity
    Reference { target: TypeName },
    /// One-to-one association
    OneToOne { target: TypeName },
    /// Collection-valued association
    Collection { element: TypeName },
}

impl PropertyKind {
    /// The associated type for one-to-one and collection mappings
    pub fn association_target(&self) -> Option<&TypeName> {
        match self {
            Self::OneToOne { target } => Some(target),
            Self::Collection { element } => Some(element),
            Self::Scalar | Self::Reference { .. } => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }
}

/// A declared property of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar,
        }
    }

    pub fn reference(name: impl Into<String>, target: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Reference {
                target: target.into(),
            },
        }
    }

    pub fn one_to_one(name: impl Into<String>, target: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::OneToOne {
                target: target.into(),
            },
        }
    }

    pub fn collection(name: impl Into<String>, element: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Collection {
                element: element.into(),
            },
        }
    }
}

/// Metadata of one mapped type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: TypeName,

    /// Direct supertype, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<TypeName>,

    /// Implemented interfaces / capability markers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeName>,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default, rename = "interface")]
    pub is_interface: bool,

    /// Carries the auditable-object capability (inherited by subtypes)
    #[serde(default)]
    pub auditable: bool,

    /// Properties declared on this type, not including inherited ones
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl TypeDescriptor {
    /// A concrete, auditable type with no supertype and no properties
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            supertype: None,
            interfaces: Vec::new(),
            is_abstract: false,
            is_interface: false,
            auditable: true,
            properties: Vec::new(),
        }
    }

    pub fn extends(mut self, supertype: impl Into<TypeName>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    pub fn not_auditable(mut self) -> Self {
        self.auditable = false;
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Concrete = neither abstract nor an interface
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract && !self.is_interface
    }

    /// Direct parents: supertype first, then interfaces
    pub fn parents(&self) -> impl Iterator<Item = &TypeName> {
        self.supertype.iter().chain(self.interfaces.iter())
    }
}
