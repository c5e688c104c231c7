//! Type identifiers and type sets
//!
//! Types are identified by their stable, fully-qualified name as exposed by
//! the host's schema. A `TypeSet` keeps names ordered so that persisted lists
//! are deterministic.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Stable, unique name of an entity type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name, trimming surrounding whitespace
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last dotted segment (`org.example.Concept` -> `Concept`)
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A set of type names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeSet(BTreeSet<TypeName>);

impl TypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.0.contains(name)
    }

    /// Membership test by plain string
    pub fn contains_name(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns true if the name was not already present
    pub fn insert(&mut self, name: TypeName) -> bool {
        self.0.insert(name)
    }

    pub fn remove(&mut self, name: &TypeName) -> bool {
        self.0.remove(name)
    }

    pub fn extend<I: IntoIterator<Item = TypeName>>(&mut self, names: I) {
        self.0.extend(names);
    }

    /// Remove every member of `other`
    pub fn subtract(&mut self, other: &TypeSet) {
        self.0.retain(|name| !other.contains(name));
    }

    pub fn union(&self, other: &TypeSet) -> TypeSet {
        TypeSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as the comma-delimited form used by the configuration store
    pub fn to_delimited(&self) -> String {
        self.0
            .iter()
            .map(TypeName::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Split a comma-delimited list into trimmed, non-blank names
    ///
    /// Names are not checked against any registry here.
    pub fn parse_delimited(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl FromIterator<TypeName> for TypeSet {
    fn from_iter<I: IntoIterator<Item = TypeName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TypeSet {
    type Item = TypeName;
    type IntoIter = std::collections::btree_set::IntoIter<TypeName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = &'a TypeName;
    type IntoIter = std::collections::btree_set::Iter<'a, TypeName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_trims() {
        let name = TypeName::new("  org.example.Concept ");
        assert_eq!(name.as_str(), "org.example.Concept");
        assert_eq!(name.simple_name(), "Concept");
    }

    #[test]
    fn test_parse_delimited_skips_blanks() {
        let names = TypeSet::parse_delimited(" a.B , ,c.D,, ");
        assert_eq!(names, vec!["a.B".to_string(), "c.D".to_string()]);
        assert!(TypeSet::parse_delimited("").is_empty());
    }

    #[test]
    fn test_to_delimited_is_sorted() {
        let set: TypeSet = ["z.Zeta", "a.Alpha"].into_iter().map(TypeName::from).collect();
        assert_eq!(set.to_delimited(), "a.Alpha,z.Zeta");
    }

    #[test]
    fn test_subtract_and_union() {
        let mut left: TypeSet = ["a", "b", "c"].into_iter().map(TypeName::from).collect();
        let right: TypeSet = ["b", "d"].into_iter().map(TypeName::from).collect();

        let all = left.union(&right);
        assert_eq!(all.len(), 4);

        left.subtract(&right);
        assert!(left.contains_name("a"));
        assert!(!left.contains_name("b"));
    }
}
