//! Keys of the monitoring policy in the key-value property store

/// Monitoring strategy (`NONE`, `ALL`, `NONE_EXCEPT`, `ALL_EXCEPT`)
pub const MONITORING_STRATEGY: &str = "auditlog.monitoringStrategy";

/// Comma-delimited type names audited under `NONE_EXCEPT`
pub const MONITORED_CLASSES: &str = "auditlog.monitoredClasses";

/// Comma-delimited type names excluded under `ALL_EXCEPT`
pub const UN_MONITORED_CLASSES: &str = "auditlog.unMonitoredClasses";

/// Whether a key is one the policy cache reacts to
pub fn is_policy_key(key: &str) -> bool {
    matches!(key, MONITORING_STRATEGY | MONITORED_CLASSES | UN_MONITORED_CLASSES)
}

/// Description stored alongside a list key when it is first written
pub fn description(key: &str) -> Option<&'static str> {
    match key {
        MONITORING_STRATEGY => Some("Selects which entity types are audited"),
        MONITORED_CLASSES => Some(
            "Type names to audit, only used when the monitoring strategy is NONE_EXCEPT",
        ),
        UN_MONITORED_CLASSES => Some(
            "Type names not to audit, only used when the monitoring strategy is ALL_EXCEPT",
        ),
        _ => None,
    }
}
