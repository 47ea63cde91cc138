//! Shared document types for the self-heal pipeline.
//!
//! These types define the stable contracts between the pipeline stages. Each
//! stage runs as its own short-lived process, so everything here is designed
//! to round-trip through the durable JSON documents in `.medic/`.

use serde::{Deserialize, Serialize};

/// Version stamped into every durable document.
pub const DOC_VERSION: u32 = 1;

/// Failure classification vocabulary.
///
/// This is untrusted input: the classification service may emit values outside
/// the known set, which deserialize to [`ErrorType::Unknown`] instead of
/// failing the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "infra/network")]
    InfraNetwork,
    #[serde(rename = "frontend-timing")]
    FrontendTiming,
    #[serde(rename = "frontend-selector")]
    FrontendSelector,
    #[serde(rename = "auth/session")]
    AuthSession,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl ErrorType {
    /// Wire name of the error type, matching its JSON representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InfraNetwork => "infra/network",
            Self::FrontendTiming => "frontend-timing",
            Self::FrontendSelector => "frontend-selector",
            Self::AuthSession => "auth/session",
            Self::Unknown => "unknown",
        }
    }
}

/// How likely the failure is to disappear on a clean rerun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransientLikelihood {
    Low,
    Medium,
    High,
}

/// Remediation action vocabulary.
///
/// Unknown values deserialize to [`ActionKind::Unknown`] so that a decision
/// document written by a newer version is reported, not crashed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RegenerateStorageState,
    ReseedDb,
    RerunE2eSubset,
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegenerateStorageState => "regenerate_storage_state",
            Self::ReseedDb => "reseed_db",
            Self::RerunE2eSubset => "rerun_e2e_subset",
            Self::Unknown => "unknown",
        }
    }
}

/// One planned remediation step, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub why: String,
}

/// Whether the validating rerun covers the failing specs or the full suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunMode {
    Subset,
    Full,
}

/// Rerun plan carried by an eligible decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunPlan {
    /// Hard ceiling on remediation attempts for this run, always in [1, 2].
    pub max_attempts: u32,
    pub mode: RerunMode,
    /// Failing spec paths the rerun is scoped to (empty in full mode).
    pub spec_paths: Vec<String>,
    /// Full rerun argv, spec paths already appended in subset mode.
    pub command: Vec<String>,
}

/// Output of the decision engine (`.medic/decision.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub version: u32,
    pub run_id: String,
    pub job_name: String,
    pub branch: String,
    pub commit: String,
    pub error_type: ErrorType,
    pub allowed: bool,
    pub transient_likelihood: TransientLikelihood,
    pub reason: String,
    /// Ordered action plan; empty whenever `allowed` is false.
    pub actions: Vec<PlannedAction>,
    /// Null whenever `allowed` is false.
    pub rerun: Option<RerunPlan>,
    pub recommendations_for_fix_agent: Vec<String>,
}

/// Classification payload from the external service.
///
/// Everything beyond `error_type` is optional; the service is free to omit
/// fields and the pipeline must not depend on their presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub error_type: ErrorType,
    #[serde(default)]
    pub self_heal_plan: Option<String>,
    #[serde(default)]
    pub fix_agent_instructions: Option<String>,
}

/// Where the classification came from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentSource {
    /// Remote classification service was called.
    Cloud,
    /// No credentials configured; classification skipped.
    Disabled,
}

/// Record of the classification service interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperAgent {
    pub source: AgentSource,
    pub cloud_agent_url: Option<String>,
    /// Raw (possibly truncated) service response, kept for triage.
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    /// Why no classification is available, when it is not.
    #[serde(default)]
    pub error: Option<String>,
}

/// Analysis block of the context document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub classification: Option<Classification>,
    pub self_heal_plan: Option<String>,
    pub fix_agent_instructions: Option<String>,
}

/// Log bookkeeping in the context document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLogs {
    pub playwright_log_path: String,
    pub playwright_log_bytes: u64,
    pub backend_log_path: String,
    pub backend_log_bytes: u64,
    /// Failing spec paths extracted from the test-runner log, at most 3.
    pub extracted_spec_paths: Vec<String>,
}

/// Normalized run context (`.medic/context.json`).
///
/// Written once per job attempt by `medic prepare` and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub version: u32,
    pub run_id: String,
    pub run_attempt: u32,
    pub job_name: String,
    pub timestamp: String,
    pub branch: String,
    pub commit: String,
    pub status: String,
    pub logs: ContextLogs,
    pub developer_agent: DeveloperAgent,
    pub analysis: Analysis,
}

impl RunContext {
    /// Error type from the classification, `Unknown` when none is available.
    pub fn error_type(&self) -> ErrorType {
        self.analysis
            .classification
            .as_ref()
            .map_or(ErrorType::Unknown, |c| c.error_type)
    }
}

/// Outcome of one executed remediation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub ok: bool,
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Terminal status of one execution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// A guardrail rejected the pass before any side effect.
    Skipped,
    RerunPassed,
    RerunFailed,
    /// The plan carried no validating rerun, so there is no verdict.
    Unknown,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::RerunPassed => "rerun_passed",
            Self::RerunFailed => "rerun_failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Why a pass was skipped, when it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    RunAttemptExceeded,
    MaxAttemptsReached,
    NotAllowedByPolicy,
}

/// Compact view of the executed context embedded in the report so consumers
/// do not have to re-read the context document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSummary {
    pub error_type: ErrorType,
    pub run_attempt: u32,
    pub extracted_spec_paths: Vec<String>,
    pub playwright_log_bytes: u64,
    pub backend_log_bytes: u64,
}

impl ContextSummary {
    pub fn from_context(context: &RunContext) -> Self {
        Self {
            error_type: context.error_type(),
            run_attempt: context.run_attempt,
            extracted_spec_paths: context.logs.extracted_spec_paths.clone(),
            playwright_log_bytes: context.logs.playwright_log_bytes,
            backend_log_bytes: context.logs.backend_log_bytes,
        }
    }
}

/// Terminal record of one execution pass (`.medic/report.json`).
///
/// Written exactly once per invocation, last, and overwritten (never appended)
/// if the same run is executed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub run_id: String,
    pub executed_at: String,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    /// Attempt number consumed by this pass; absent when skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    pub max_attempts: u32,
    pub decision: Decision,
    pub context_summary: ContextSummary,
    pub actions: Vec<ActionOutcome>,
    pub recommendations_for_fix_agent: Vec<String>,
}
