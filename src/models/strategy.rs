//! Monitoring strategy
//!
//! Selects how the explicit type lists are interpreted when deciding whether
//! a type is audited.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuditError;

/// Which entity types get audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringStrategy {
    /// Nothing is audited
    #[default]
    None,
    /// Every auditable type is audited
    All,
    /// Only the explicitly monitored types (and their closure) are audited
    NoneExcept,
    /// Everything except the explicitly unmonitored types is audited
    AllExcept,
}

impl MonitoringStrategy {
    /// All strategies, in display order
    pub fn all() -> &'static [MonitoringStrategy] {
        &[Self::None, Self::All, Self::NoneExcept, Self::AllExcept]
    }

    /// Whether this strategy reads one of the explicit type lists
    pub fn uses_explicit_lists(&self) -> bool {
        matches!(self, Self::NoneExcept | Self::AllExcept)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::All => "ALL",
            Self::NoneExcept => "NONE_EXCEPT",
            Self::AllExcept => "ALL_EXCEPT",
        }
    }
}

impl fmt::Display for MonitoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitoringStrategy {
    type Err = AuditError;

    /// Accepts the stored form (`NONE_EXCEPT`) case-insensitively, and
    /// dashes in place of underscores for command-line use
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "NONE" => Ok(Self::None),
            "ALL" => Ok(Self::All),
            "NONE_EXCEPT" => Ok(Self::NoneExcept),
            "ALL_EXCEPT" => Ok(Self::AllExcept),
            _ => Err(AuditError::Config(format!(
                "Unknown monitoring strategy '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_form() {
        assert_eq!(
            "NONE_EXCEPT".parse::<MonitoringStrategy>().unwrap(),
            MonitoringStrategy::NoneExcept
        );
        assert_eq!(
            "all-except".parse::<MonitoringStrategy>().unwrap(),
            MonitoringStrategy::AllExcept
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "SOMETIMES".parse::<MonitoringStrategy>().unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn test_display_round_trip() {
        for strategy in MonitoringStrategy::all() {
            let parsed: MonitoringStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(*strategy, parsed);
        }
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(MonitoringStrategy::default(), MonitoringStrategy::None);
        assert!(!MonitoringStrategy::All.uses_explicit_lists());
        assert!(MonitoringStrategy::AllExcept.uses_explicit_lists());
    }
}
