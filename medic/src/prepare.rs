//! Orchestration for `medic prepare`.
//!
//! Collects run metadata and logs, asks the classification service for a
//! failure label, and writes the context document. The classifier is
//! best-effort: this command only fails when the context cannot be written.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::core::spec_paths::extract_spec_paths;
use crate::core::types::{
    AgentSource, Analysis, ContextLogs, DOC_VERSION, DeveloperAgent, RunContext,
};
use crate::io::classify::{Classifier, ClassifyOutcome, ClassifyRequest};
use crate::io::context_doc::write_context;
use crate::io::env::EnvConfig;
use crate::io::paths::MedicPaths;

/// Cap on log bytes shipped to the classification service. The full files
/// stay on disk; failures live at the tail.
const CLASSIFY_LOG_LIMIT: usize = 64 * 1024;

/// Outcome of `medic prepare`.
#[derive(Debug, Clone)]
pub struct PrepareOutcome {
    pub context_path: PathBuf,
    /// Whether a usable classification made it into the context.
    pub classified: bool,
}

/// Build and persist the run context.
///
/// `classifier` is `None` when the service is not configured; the context is
/// still written, with the degradation recorded under `developer_agent`.
pub fn run_prepare<C: Classifier>(
    root: &Path,
    env: &EnvConfig,
    classifier: Option<&C>,
) -> Result<PrepareOutcome> {
    let paths = MedicPaths::new(root, &env.state_dir);

    let (playwright_text, playwright_bytes) = read_log(&root.join(&env.playwright_log));
    let (backend_text, backend_bytes) = read_log(&root.join(&env.backend_log));
    let spec_paths = extract_spec_paths(&playwright_text);
    info!(
        run_id = %env.run_id,
        run_attempt = env.run_attempt,
        playwright_bytes,
        backend_bytes,
        spec_paths = spec_paths.len(),
        "collected run inputs"
    );

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let request = ClassifyRequest {
        playwright_log: tail(&playwright_text, CLASSIFY_LOG_LIMIT).to_string(),
        backend_log: tail(&backend_text, CLASSIFY_LOG_LIMIT).to_string(),
        run_id: env.run_id.clone(),
        run_attempt: env.run_attempt,
        job_name: env.job_name.clone(),
        timestamp: timestamp.clone(),
        branch: env.branch.clone(),
        commit: env.commit.clone(),
        status: env.status.clone(),
    };

    let (developer_agent, analysis) = match classifier {
        None => {
            info!("classification service not configured, continuing without");
            (
                DeveloperAgent {
                    source: AgentSource::Disabled,
                    cloud_agent_url: None,
                    response: None,
                    error: Some(
                        "classification service not configured \
                         (set MEDIC_AGENT_URL and MEDIC_AGENT_TOKEN)"
                            .to_string(),
                    ),
                },
                empty_analysis(),
            )
        }
        Some(classifier) => match classifier.classify(&request) {
            ClassifyOutcome::Classified {
                classification,
                raw,
            } => {
                info!(error_type = classification.error_type.as_str(), "failure classified");
                let analysis = Analysis {
                    self_heal_plan: classification.self_heal_plan.clone(),
                    fix_agent_instructions: classification.fix_agent_instructions.clone(),
                    classification: Some(classification),
                };
                (
                    DeveloperAgent {
                        source: AgentSource::Cloud,
                        cloud_agent_url: env.agent_url.clone(),
                        response: Some(raw),
                        error: None,
                    },
                    analysis,
                )
            }
            ClassifyOutcome::Malformed { raw, error } => {
                warn!(error = %error, "classifier response unusable");
                (
                    DeveloperAgent {
                        source: AgentSource::Cloud,
                        cloud_agent_url: env.agent_url.clone(),
                        response: Some(serde_json::Value::String(raw)),
                        error: Some(error),
                    },
                    empty_analysis(),
                )
            }
            ClassifyOutcome::Unavailable { error } => {
                warn!(error = %error, "classifier unavailable");
                (
                    DeveloperAgent {
                        source: AgentSource::Cloud,
                        cloud_agent_url: env.agent_url.clone(),
                        response: None,
                        error: Some(error),
                    },
                    empty_analysis(),
                )
            }
        },
    };

    let classified = analysis.classification.is_some();
    let context = RunContext {
        version: DOC_VERSION,
        run_id: env.run_id.clone(),
        run_attempt: env.run_attempt,
        job_name: env.job_name.clone(),
        timestamp,
        branch: env.branch.clone(),
        commit: env.commit.clone(),
        status: env.status.clone(),
        logs: ContextLogs {
            playwright_log_path: env.playwright_log.display().to_string(),
            playwright_log_bytes: playwright_bytes,
            backend_log_path: env.backend_log.display().to_string(),
            backend_log_bytes: backend_bytes,
            extracted_spec_paths: spec_paths,
        },
        developer_agent,
        analysis,
    };

    write_context(&paths.context_path, &context)?;
    info!(path = %paths.context_path.display(), classified, "context written");
    Ok(PrepareOutcome {
        context_path: paths.context_path,
        classified,
    })
}

fn empty_analysis() -> Analysis {
    Analysis {
        classification: None,
        self_heal_plan: None,
        fix_agent_instructions: None,
    }
}

/// Read a log file leniently: a missing or unreadable log is an empty log.
fn read_log(path: &Path) -> (String, u64) {
    match fs::read(path) {
        Ok(bytes) => {
            let len = bytes.len() as u64;
            (String::from_utf8_lossy(&bytes).into_owned(), len)
        }
        Err(_) => (String::new(), 0),
    }
}

/// Last `limit` bytes of `text`, aligned to a char boundary.
fn tail(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut start = text.len() - limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
