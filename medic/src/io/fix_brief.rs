//! Fix-agent hand-off brief.
//!
//! When a heal pass ends with a failed rerun, the failure leaves the
//! self-heal path and goes to the automated fix pipeline. The brief is the
//! human-readable summary that travels with it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use tracing::debug;

use crate::core::types::Report;

const FIX_BRIEF_TEMPLATE: &str = include_str!("templates/fix_brief.md");

/// Render the brief for a finished report.
pub fn render_fix_brief(report: &Report) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("fix_brief", FIX_BRIEF_TEMPLATE)
        .context("parse fix brief template")?;
    let template = env.get_template("fix_brief").context("load fix brief template")?;
    let rendered = template.render(context! {
        run_id => &report.run_id,
        job_name => &report.decision.job_name,
        branch => &report.decision.branch,
        commit => &report.decision.commit,
        status => report.status,
        reason => report.reason,
        error_type => report.context_summary.error_type,
        spec_paths => &report.context_summary.extracted_spec_paths,
        actions => &report.actions,
        recommendations => &report.recommendations_for_fix_agent,
    })?;
    Ok(rendered)
}

/// Render and write the brief next to the report.
pub fn write_fix_brief(path: &Path, report: &Report) -> Result<()> {
    let rendered = render_fix_brief(report)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create fix brief dir {}", parent.display()))?;
    }
    fs::write(path, rendered).with_context(|| format!("write fix brief {}", path.display()))?;
    debug!(path = %path.display(), "fix brief written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        ActionKind, ActionOutcome, ContextSummary, DOC_VERSION, Decision, ErrorType, Report,
        ReportStatus, TransientLikelihood,
    };

    fn report() -> Report {
        Report {
            version: DOC_VERSION,
            run_id: "run-1".to_string(),
            executed_at: "2026-01-01T00:00:00Z".to_string(),
            status: ReportStatus::RerunFailed,
            reason: None,
            attempt: Some(1),
            max_attempts: 2,
            decision: Decision {
                version: DOC_VERSION,
                run_id: "run-1".to_string(),
                job_name: "e2e".to_string(),
                branch: "main".to_string(),
                commit: "abc123".to_string(),
                error_type: ErrorType::FrontendTiming,
                allowed: true,
                transient_likelihood: TransientLikelihood::High,
                reason: "frontend-timing failures are plausibly transient".to_string(),
                actions: vec![],
                rerun: None,
                recommendations_for_fix_agent: vec![],
            },
            context_summary: ContextSummary {
                error_type: ErrorType::FrontendTiming,
                run_attempt: 1,
                extracted_spec_paths: vec!["tests/e2e/booking.spec.ts".to_string()],
                playwright_log_bytes: 100,
                backend_log_bytes: 0,
            },
            actions: vec![ActionOutcome {
                kind: ActionKind::RerunE2eSubset,
                ok: false,
                exit_code: Some(1),
                command: None,
                log_path: None,
                note: None,
            }],
            recommendations_for_fix_agent: vec!["look at the waits".to_string()],
        }
    }

    #[test]
    fn brief_contains_failure_and_actions() {
        let rendered = render_fix_brief(&report()).expect("render");
        assert!(rendered.contains("run-1"));
        assert!(rendered.contains("frontend-timing"));
        assert!(rendered.contains("tests/e2e/booking.spec.ts"));
        assert!(rendered.contains("rerun_e2e_subset"));
        assert!(rendered.contains("(exit 1)"));
        assert!(rendered.contains("look at the waits"));
    }

    #[test]
    fn empty_sections_render_placeholders() {
        let mut report = report();
        report.actions.clear();
        report.recommendations_for_fix_agent.clear();
        let rendered = render_fix_brief(&report).expect("render");
        assert!(rendered.contains("None."));
    }

    #[test]
    fn write_creates_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state").join("fix_brief.md");
        write_fix_brief(&path, &report()).expect("write");
        assert!(path.is_file());
    }
}
