//! Orchestration for `medic heal`.
//!
//! Executes the decision under the attempt guardrails. The report is the
//! sole externally observable outcome and is written exactly once per
//! invocation, whatever happens in between.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::core::decision::clamp_max_attempts;
use crate::core::types::{
    ActionKind, ActionOutcome, ContextSummary, DOC_VERSION, Decision, Report, ReportStatus,
    SkipReason,
};
use crate::io::actions::{ActionRequest, ActionRunner};
use crate::io::attempt_store::{load_attempt_state, write_attempt_state};
use crate::io::config::{MedicConfig, load_config};
use crate::io::context_doc::load_context;
use crate::io::decision_doc::load_decision;
use crate::io::env::EnvConfig;
use crate::io::fix_brief::write_fix_brief;
use crate::io::paths::MedicPaths;
use crate::io::report_doc::write_report;

/// Execute one heal pass and return the written report.
pub fn run_heal<R: ActionRunner>(root: &Path, env: &EnvConfig, runner: &R) -> Result<Report> {
    let paths = MedicPaths::new(root, &env.state_dir);
    let cfg = load_config(&paths.config_path)?;
    let decision = load_decision(&paths.decision_path)
        .context("load decision document (run `medic decide` first)")?;
    if decision.run_id != env.run_id {
        bail!(
            "decision is for run '{}' but this invocation is run '{}'",
            decision.run_id,
            env.run_id
        );
    }

    let context_summary = summarize_context(&paths, env, &decision);
    let max_attempts = decision
        .rerun
        .as_ref()
        .map(|rerun| rerun.max_attempts)
        .unwrap_or_else(|| {
            clamp_max_attempts(env.max_attempts_override.unwrap_or(cfg.max_attempts_default))
        });

    let mut attempt_state = load_attempt_state(&paths.attempt_state_path, &env.run_id)?;

    // Guardrails, in order. Any failing one ends the pass with a skipped
    // report and no further side effects.
    let skip_reason = if env.run_attempt > max_attempts {
        Some(SkipReason::RunAttemptExceeded)
    } else if attempt_state.attempts >= max_attempts {
        Some(SkipReason::MaxAttemptsReached)
    } else if !decision.allowed {
        Some(SkipReason::NotAllowedByPolicy)
    } else {
        None
    };

    if let Some(reason) = skip_reason {
        info!(reason = ?reason, run_id = %env.run_id, "heal pass skipped");
        let report = build_report(
            &decision,
            context_summary,
            ReportStatus::Skipped,
            Some(reason),
            None,
            max_attempts,
            Vec::new(),
        );
        finish(&paths, &report)?;
        return Ok(report);
    }

    // Count the attempt before running anything: a crash mid-execution must
    // still consume budget, preferring under- to over-remediation.
    attempt_state.attempts += 1;
    write_attempt_state(&paths.attempt_state_path, &attempt_state)?;
    info!(
        attempt = attempt_state.attempts,
        max_attempts, "executing heal plan"
    );

    let outcomes = execute_actions(root, env, &cfg, &decision, runner, &paths);
    let status = derive_status(&outcomes);

    let report = build_report(
        &decision,
        context_summary,
        status,
        None,
        Some(attempt_state.attempts),
        max_attempts,
        outcomes,
    );
    finish(&paths, &report)?;
    Ok(report)
}

fn execute_actions<R: ActionRunner>(
    root: &Path,
    env: &EnvConfig,
    cfg: &MedicConfig,
    decision: &Decision,
    runner: &R,
    paths: &MedicPaths,
) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::new();
    for action in &decision.actions {
        let command = match action.kind {
            ActionKind::RegenerateStorageState => Some(cfg.storage_state_command.clone()),
            ActionKind::ReseedDb => Some(cfg.reseed_command.clone()),
            ActionKind::RerunE2eSubset => decision.rerun.as_ref().map(|r| r.command.clone()),
            ActionKind::Unknown => None,
        };

        let outcome = match command {
            None => {
                // Unknown or unplannable actions are reported, not fatal.
                warn!(action = action.kind.as_str(), "skipping unexecutable action");
                ActionOutcome {
                    kind: action.kind,
                    ok: false,
                    exit_code: None,
                    command: None,
                    log_path: None,
                    note: Some(skip_note(action.kind)),
                }
            }
            Some(command) => {
                let request = ActionRequest {
                    workdir: root.to_path_buf(),
                    log_path: paths
                        .logs_dir
                        .join(format!("{}.log", action.kind.as_str())),
                    timeout: Duration::from_secs(cfg.action_timeout_secs),
                    output_limit_bytes: cfg.output_limit_bytes,
                };
                match runner.run(action.kind, &command, &request) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        // Runner infrastructure failure: recorded like an
                        // action failure so the rest of the plan still runs,
                        // in particular the validating rerun.
                        warn!(action = action.kind.as_str(), err = %err, "action runner error");
                        ActionOutcome {
                            kind: action.kind,
                            ok: false,
                            exit_code: None,
                            command: Some(command),
                            log_path: None,
                            note: Some(format!("runner error: {err}")),
                        }
                    }
                }
            }
        };
        info!(
            action = outcome.kind.as_str(),
            ok = outcome.ok,
            run_id = %env.run_id,
            "action finished"
        );
        outcomes.push(outcome);
    }
    outcomes
}

fn skip_note(kind: ActionKind) -> String {
    match kind {
        ActionKind::RerunE2eSubset => "skipped: decision carries no rerun plan".to_string(),
        _ => "skipped: unknown action type".to_string(),
    }
}

/// The final status comes solely from the validating rerun, when present.
fn derive_status(outcomes: &[ActionOutcome]) -> ReportStatus {
    match outcomes
        .iter()
        .rev()
        .find(|outcome| outcome.kind == ActionKind::RerunE2eSubset)
    {
        Some(outcome) if outcome.ok => ReportStatus::RerunPassed,
        Some(_) => ReportStatus::RerunFailed,
        None => {
            warn!("plan carried no validating rerun, status unknown");
            ReportStatus::Unknown
        }
    }
}

fn summarize_context(paths: &MedicPaths, env: &EnvConfig, decision: &Decision) -> ContextSummary {
    match load_context(&paths.context_path) {
        Ok(context) => ContextSummary::from_context(&context),
        Err(err) => {
            // The report still carries a summary; fall back to what the
            // decision already knows.
            warn!(err = %err, "context unavailable for report summary");
            ContextSummary {
                error_type: decision.error_type,
                run_attempt: env.run_attempt,
                extracted_spec_paths: decision
                    .rerun
                    .as_ref()
                    .map(|rerun| rerun.spec_paths.clone())
                    .unwrap_or_default(),
                playwright_log_bytes: 0,
                backend_log_bytes: 0,
            }
        }
    }
}

fn build_report(
    decision: &Decision,
    context_summary: ContextSummary,
    status: ReportStatus,
    reason: Option<SkipReason>,
    attempt: Option<u32>,
    max_attempts: u32,
    actions: Vec<ActionOutcome>,
) -> Report {
    Report {
        version: DOC_VERSION,
        run_id: decision.run_id.clone(),
        executed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        status,
        reason,
        attempt,
        max_attempts,
        decision: decision.clone(),
        context_summary,
        actions,
        recommendations_for_fix_agent: decision.recommendations_for_fix_agent.clone(),
    }
}

/// Write the report (always) and the fix brief (on a failed rerun), as the
/// last step of the pass.
fn finish(paths: &MedicPaths, report: &Report) -> Result<()> {
    write_report(&paths.report_path, report)?;
    if report.status == ReportStatus::RerunFailed {
        write_fix_brief(&paths.fix_brief_path, report)?;
    }
    info!(
        status = report.status.as_str(),
        path = %paths.report_path.display(),
        "report written"
    );
    Ok(())
}
