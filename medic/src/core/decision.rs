//! Self-heal eligibility policy and action planning.
//!
//! Pure: the decision is a deterministic function of the run context and the
//! policy knobs, so the whole rubric is testable without touching disk.

use crate::core::types::{
    ActionKind, DOC_VERSION, Decision, ErrorType, PlannedAction, RerunMode, RerunPlan, RunContext,
    TransientLikelihood,
};

/// Hard bounds on the per-run remediation budget. Config may ask for more but
/// never gets it.
pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 2;

/// Policy knobs resolved from config and environment.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    /// Requested attempt ceiling, clamped into [1, 2] before use.
    pub max_attempts: u32,
    /// Base rerun argv; spec paths are appended in subset mode.
    pub rerun_command: Vec<String>,
}

/// Clamp a requested attempt ceiling into the permitted [1, 2] window.
pub fn clamp_max_attempts(requested: u32) -> u32 {
    requested.clamp(MIN_ATTEMPTS, MAX_ATTEMPTS)
}

/// Whether an error type is eligible for automated remediation.
pub fn is_self_healable(error_type: ErrorType) -> bool {
    matches!(
        error_type,
        ErrorType::InfraNetwork | ErrorType::FrontendTiming | ErrorType::AuthSession
    )
}

/// How likely a clean rerun is to pass, per error type.
pub fn transient_likelihood(error_type: ErrorType) -> TransientLikelihood {
    match error_type {
        ErrorType::InfraNetwork | ErrorType::FrontendTiming => TransientLikelihood::High,
        ErrorType::AuthSession => TransientLikelihood::Medium,
        ErrorType::FrontendSelector | ErrorType::Unknown => TransientLikelihood::Low,
    }
}

/// Derive a bounded action plan from a run context.
///
/// Ineligible contexts produce `allowed = false` with no actions and no rerun
/// plan. Eligible plans are ordered cheapest-first and always end with the
/// validating rerun.
pub fn decide(context: &RunContext, policy: &DecisionPolicy) -> Decision {
    let error_type = context.error_type();
    let allowed = is_self_healable(error_type);
    let likelihood = transient_likelihood(error_type);

    let (actions, rerun) = if allowed {
        (
            plan_actions(error_type),
            Some(plan_rerun(context, policy)),
        )
    } else {
        (Vec::new(), None)
    };

    Decision {
        version: DOC_VERSION,
        run_id: context.run_id.clone(),
        job_name: context.job_name.clone(),
        branch: context.branch.clone(),
        commit: context.commit.clone(),
        error_type,
        allowed,
        transient_likelihood: likelihood,
        reason: reason_for(context, error_type, allowed),
        actions,
        rerun,
        recommendations_for_fix_agent: recommendations_for(context, error_type, allowed),
    }
}

fn plan_actions(error_type: ErrorType) -> Vec<PlannedAction> {
    let mut actions = Vec::new();
    // Session refresh must come before reseeding so the reseed and the rerun
    // run against a valid session.
    if error_type == ErrorType::AuthSession {
        actions.push(PlannedAction {
            kind: ActionKind::RegenerateStorageState,
            why: "refresh expired browser session state".to_string(),
        });
    }
    actions.push(PlannedAction {
        kind: ActionKind::ReseedDb,
        why: "restore the baseline e2e dataset".to_string(),
    });
    // The rerun is the actual correctness check and always comes last.
    actions.push(PlannedAction {
        kind: ActionKind::RerunE2eSubset,
        why: "validate that the environment fixes took effect".to_string(),
    });
    actions
}

fn plan_rerun(context: &RunContext, policy: &DecisionPolicy) -> RerunPlan {
    let spec_paths = context.logs.extracted_spec_paths.clone();
    let mode = if spec_paths.is_empty() {
        RerunMode::Full
    } else {
        RerunMode::Subset
    };
    let mut command = policy.rerun_command.clone();
    command.extend(spec_paths.iter().cloned());
    RerunPlan {
        max_attempts: clamp_max_attempts(policy.max_attempts),
        mode,
        spec_paths,
        command,
    }
}

fn reason_for(context: &RunContext, error_type: ErrorType, allowed: bool) -> String {
    if allowed {
        return format!("{} failures are plausibly transient", error_type.as_str());
    }
    if context.analysis.classification.is_none() {
        return "no classification available".to_string();
    }
    format!("{} is not in the self-heal policy", error_type.as_str())
}

fn recommendations_for(context: &RunContext, error_type: ErrorType, allowed: bool) -> Vec<String> {
    let mut recommendations = Vec::new();
    if let Some(instructions) = context
        .analysis
        .fix_agent_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        recommendations.push(instructions.trim().to_string());
    }
    if !allowed {
        recommendations.push(format!(
            "failure classified as {}; a code-level fix is likely required",
            error_type.as_str()
        ));
    }
    if !context.logs.extracted_spec_paths.is_empty() {
        recommendations.push(format!(
            "failing specs: {}",
            context.logs.extracted_spec_paths.join(", ")
        ));
    }
    recommendations
}
