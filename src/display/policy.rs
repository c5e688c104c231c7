//! Monitoring policy display formatting

use crate::models::{MonitoringStrategy, TypeSet};
use crate::policy::PolicySnapshot;
use crate::services::TypeStatus;

fn format_set(output: &mut String, title: &str, set: &TypeSet) {
    output.push_str(&format!("{} ({}):\n", title, set.len()));
    if set.is_empty() {
        output.push_str("  (none)\n");
    }
    for name in set.iter() {
        output.push_str(&format!("  {}\n", name));
    }
}

/// Format the current policy with the lists that matter for its strategy
pub fn format_policy(snapshot: &PolicySnapshot, issues: &[String]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Strategy: {}\n", snapshot.strategy));

    match snapshot.strategy {
        MonitoringStrategy::None => output.push_str("No types are audited.\n"),
        MonitoringStrategy::All => output.push_str("Every auditable type is audited.\n"),
        MonitoringStrategy::NoneExcept => {
            output.push('\n');
            format_set(&mut output, "Monitored", &snapshot.monitored);
            output.push('\n');
            format_set(&mut output, "Implicitly monitored", &snapshot.implicit);
        }
        MonitoringStrategy::AllExcept => {
            output.push('\n');
            format_set(&mut output, "Not monitored", &snapshot.unmonitored);
            output.push('\n');
            format_set(&mut output, "Implicitly monitored", &snapshot.implicit);
        }
    }

    if !issues.is_empty() {
        output.push_str("\nConfiguration issues:\n");
        for issue in issues {
            output.push_str(&format!("  ! {}\n", issue));
        }
    }

    output
}

/// Format registered types with their audit status
pub fn format_type_list(types: &[TypeStatus]) -> String {
    if types.is_empty() {
        return "No types registered.\n\nRun 'auditlog init' to load the demo schema.".to_string();
    }

    let name_width = types
        .iter()
        .map(|t| t.name.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<9}  {:<9}  {}\n",
        "Type",
        "Kind",
        "Auditable",
        "Monitored",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<9}  {:-<9}  {:-<9}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for status in types {
        output.push_str(&format!(
            "{:<name_width$}  {:<9}  {:<9}  {}\n",
            status.name,
            if status.concrete { "concrete" } else { "abstract" },
            if status.auditable { "yes" } else { "no" },
            if status.monitored { "yes" } else { "no" },
            name_width = name_width,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn set(names: &[&str]) -> Arc<TypeSet> {
        let mut set = TypeSet::new();
        for name in names {
            set.insert((*name).into());
        }
        Arc::new(set)
    }

    #[test]
    fn test_format_none_except_policy() {
        let snapshot = PolicySnapshot {
            strategy: MonitoringStrategy::NoneExcept,
            monitored: set(&["clinic.Concept"]),
            unmonitored: set(&["clinic.Location"]),
            implicit: set(&["clinic.ConceptName"]),
        };
        let output = format_policy(&snapshot, &[]);

        assert!(output.contains("Strategy: NONE_EXCEPT"));
        assert!(output.contains("Monitored (1):\n  clinic.Concept"));
        assert!(output.contains("clinic.ConceptName"));
        // The unmonitored list has no effect under this strategy
        assert!(!output.contains("clinic.Location"));
    }

    #[test]
    fn test_format_policy_issues() {
        let snapshot = PolicySnapshot {
            strategy: MonitoringStrategy::All,
            monitored: set(&[]),
            unmonitored: set(&[]),
            implicit: set(&[]),
        };
        let issues = vec!["Unknown type 'org.gone.Widget'".to_string()];
        let output = format_policy(&snapshot, &issues);
        assert!(output.contains("Every auditable type"));
        assert!(output.contains("! Unknown type"));
    }

    #[test]
    fn test_format_type_list() {
        let types = vec![TypeStatus {
            name: "clinic.Setting".into(),
            concrete: true,
            auditable: false,
            monitored: false,
        }];
        let output = format_type_list(&types);
        assert!(output.contains("clinic.Setting"));
        assert!(output.contains("concrete"));
        assert!(format_type_list(&[]).starts_with("No types registered."));
    }
}
