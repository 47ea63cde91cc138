//! Orchestration for `medic assess`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::risk::{ChangeSet, RiskAssessment, assess};

/// Score a change set document and derive auto-merge eligibility.
///
/// A missing or malformed change set is fatal: scoring a guessed change
/// would make the eligibility decision meaningless.
pub fn run_assess(changeset_path: &Path) -> Result<RiskAssessment> {
    let contents = fs::read_to_string(changeset_path)
        .with_context(|| format!("read change set {}", changeset_path.display()))?;
    let change: ChangeSet = serde_json::from_str(&contents)
        .with_context(|| format!("parse change set {}", changeset_path.display()))?;

    let assessment = assess(&change);
    info!(
        score = assessment.score,
        level = ?assessment.level,
        auto_merge_eligible = assessment.auto_merge_eligible,
        "change set assessed"
    );
    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk::RiskLevel;

    #[test]
    fn assesses_a_change_set_document() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("changeset.json");
        fs::write(
            &path,
            serde_json::json!({
                "error_type": "frontend-selector",
                "changed_files": ["tests/e2e/a.spec"],
                "stats": {"files_changed": 1, "lines_total": 10},
                "validation_ok": true
            })
            .to_string(),
        )
        .expect("write");

        let assessment = run_assess(&path).expect("assess");
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(assessment.auto_merge_eligible);
    }

    #[test]
    fn malformed_change_set_is_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("changeset.json");
        fs::write(&path, "{\"changed_files\": 7}").expect("write");
        let err = run_assess(&path).unwrap_err();
        assert!(err.to_string().contains("parse change set"));
    }

    #[test]
    fn missing_change_set_is_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = run_assess(&temp.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("read change set"));
    }
}
