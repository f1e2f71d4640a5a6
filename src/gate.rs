// 🚦 Build Gate - load, validate, pass/fail
// Consumed by CI: a non-empty violation list fails the publication

use crate::error::Result;
use crate::registry::Registry;
use crate::validation::ValidationError;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Passed {
        checked: usize,
    },
    Failed {
        checked: usize,
        errors: Vec<ValidationError>,
    },
}

impl GateOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, GateOutcome::Passed { .. })
    }

    pub fn checked(&self) -> usize {
        match self {
            GateOutcome::Passed { checked } | GateOutcome::Failed { checked, .. } => *checked,
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            GateOutcome::Passed { .. } => &[],
            GateOutcome::Failed { errors, .. } => errors,
        }
    }

    /// Lines printed by the CLI, in order
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            GateOutcome::Passed { checked } => {
                vec![format!("Registry validation passed for {} badge(s).", checked)]
            }
            GateOutcome::Failed { errors, .. } => {
                let mut lines = vec!["Registry validation failed:".to_string()];
                lines.extend(errors.iter().map(|e| format!(" - {}", e)));
                lines
            }
        }
    }
}

/// Evaluate an already-loaded snapshot
pub fn evaluate(registry: &Registry) -> GateOutcome {
    let checked = registry.len();
    let errors = registry.validate();
    info!(checked, violations = errors.len(), "registry validated");

    if errors.is_empty() {
        GateOutcome::Passed { checked }
    } else {
        GateOutcome::Failed { checked, errors }
    }
}

/// Load the store under `root` and evaluate it.
/// A malformed record is an `Err`, distinct from a failed gate.
pub fn run(root: &Path) -> Result<GateOutcome> {
    let registry = Registry::load(root)?;
    Ok(evaluate(&registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn write(root: &Path, relative: &str, record: serde_json::Value) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, record.to_string()).unwrap();
    }

    fn record(version: &str, status: &str) -> serde_json::Value {
        json!({
            "vendor": "acme-cloud",
            "application": "cloud-sso",
            "version": version,
            "badge_type": "free-oidc-support",
            "status": status,
            "issued_at": "2024-05-02T00:00:00Z",
            "digital_signature": "c2ln"
        })
    }

    #[test]
    fn test_gate_passes_clean_store() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "acme-cloud/cloud-sso/1.0.1.json", record("1.0.1", "certified"));
        write(dir.path(), "acme-cloud/cloud-sso/1.0.2.json", record("1.0.2", "pending"));

        let outcome = run(dir.path()).unwrap();

        assert!(outcome.passed());
        assert_eq!(outcome.checked(), 2);
        assert_eq!(
            outcome.report_lines(),
            vec!["Registry validation passed for 2 badge(s).".to_string()]
        );
    }

    #[test]
    fn test_gate_fails_and_lists_every_violation() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "acme-cloud/cloud-sso/1.0.1.json", record("1.0.1", "revoked"));
        write(dir.path(), "copy/1.0.1.json", record("1.0.1", "certified"));

        let outcome = run(dir.path()).unwrap();

        assert!(!outcome.passed());
        assert_eq!(outcome.errors().len(), 2);
        let lines = outcome.report_lines();
        assert_eq!(lines[0], "Registry validation failed:");
        assert_eq!(lines.len(), 3);
        assert!(lines[1..].iter().all(|line| line.starts_with(" - ")));
    }

    #[test]
    fn test_gate_empty_store_passes() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path()).unwrap();

        assert_eq!(outcome, GateOutcome::Passed { checked: 0 });
    }

    #[test]
    fn test_gate_malformed_record_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "not json").unwrap();

        assert!(run(dir.path()).unwrap_err().is_malformed());
    }
}
