//! Test-only helpers for building pipeline fixtures.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::types::{
    ActionKind, ActionOutcome, AgentSource, Analysis, Classification, ContextLogs, DOC_VERSION,
    DeveloperAgent, ErrorType, RunContext,
};
use crate::io::actions::{ActionRequest, ActionRunner};
use crate::io::classify::{Classifier, ClassifyOutcome, ClassifyRequest};
use crate::io::context_doc;
use crate::io::env::EnvConfig;
use crate::io::paths::MedicPaths;

/// A temporary workspace with a `.medic` state directory.
pub struct TestState {
    temp: tempfile::TempDir,
}

impl TestState {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn paths(&self) -> MedicPaths {
        MedicPaths::new(self.root(), Path::new(".medic"))
    }

    /// Environment for run `run-1`, attempt 1, no classifier configured.
    pub fn env(&self) -> EnvConfig {
        EnvConfig {
            run_id: "run-1".to_string(),
            run_attempt: 1,
            job_name: "e2e".to_string(),
            branch: "main".to_string(),
            commit: "abc123".to_string(),
            status: "failure".to_string(),
            playwright_log: self.root().join("playwright.log"),
            backend_log: self.root().join("backend.log"),
            agent_url: None,
            agent_token: None,
            max_attempts_override: None,
            state_dir: PathBuf::from(".medic"),
        }
    }

    pub fn write_context(&self, context: &RunContext) -> Result<()> {
        context_doc::write_context(&self.paths().context_path, context)
    }
}

/// A deterministic run context with an optional classification.
pub fn context_fixture(run_id: &str, error_type: Option<ErrorType>) -> RunContext {
    RunContext {
        version: DOC_VERSION,
        run_id: run_id.to_string(),
        run_attempt: 1,
        job_name: "e2e".to_string(),
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        branch: "main".to_string(),
        commit: "abc123".to_string(),
        status: "failure".to_string(),
        logs: ContextLogs {
            playwright_log_path: "playwright.log".to_string(),
            playwright_log_bytes: 42,
            backend_log_path: "backend.log".to_string(),
            backend_log_bytes: 0,
            extracted_spec_paths: vec!["tests/e2e/booking.spec.ts".to_string()],
        },
        developer_agent: DeveloperAgent {
            source: AgentSource::Cloud,
            cloud_agent_url: Some("https://agent.example/classify".to_string()),
            response: None,
            error: None,
        },
        analysis: Analysis {
            classification: error_type.map(|error_type| Classification {
                error_type,
                self_heal_plan: None,
                fix_agent_instructions: None,
            }),
            self_heal_plan: None,
            fix_agent_instructions: None,
        },
    }
}

/// Classifier that returns a scripted outcome without any network.
pub struct ScriptedClassifier {
    pub outcome: ClassifyOutcome,
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, _request: &ClassifyRequest) -> ClassifyOutcome {
        self.outcome.clone()
    }
}

/// Action runner that returns scripted outcomes and records call order.
pub struct ScriptedActionRunner {
    /// Action kinds that should report `ok = false`.
    failing: Vec<ActionKind>,
    calls: RefCell<Vec<ActionKind>>,
}

impl ScriptedActionRunner {
    pub fn passing() -> Self {
        Self::failing_on(Vec::new())
    }

    pub fn failing_on(failing: Vec<ActionKind>) -> Self {
        Self {
            failing,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Kinds run so far, in invocation order.
    pub fn calls(&self) -> Vec<ActionKind> {
        self.calls.borrow().clone()
    }
}

impl ActionRunner for ScriptedActionRunner {
    fn run(
        &self,
        kind: ActionKind,
        command: &[String],
        _request: &ActionRequest,
    ) -> Result<ActionOutcome> {
        self.calls.borrow_mut().push(kind);
        let ok = !self.failing.contains(&kind);
        Ok(ActionOutcome {
            kind,
            ok,
            exit_code: Some(if ok { 0 } else { 1 }),
            command: Some(command.to_vec()),
            log_path: None,
            note: None,
        })
    }
}
