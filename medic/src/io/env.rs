//! Environment configuration surface.
//!
//! Every knob is optional with a documented default, except that a missing
//! classification token degrades the pipeline (no classification) rather than
//! failing it.

use std::path::PathBuf;

/// Run identity and per-invocation settings resolved from the environment.
///
/// | Variable              | Meaning                             | Default            |
/// |-----------------------|-------------------------------------|--------------------|
/// | `GITHUB_RUN_ID`       | stable run identifier               | `local`            |
/// | `GITHUB_RUN_ATTEMPT`  | workflow-level rerun counter        | `1`                |
/// | `GITHUB_JOB`          | job name                            | `e2e`              |
/// | `GITHUB_REF_NAME`     | branch                              | empty              |
/// | `GITHUB_SHA`          | commit                              | empty              |
/// | `MEDIC_RUN_STATUS`    | observed job status                 | `failure`          |
/// | `MEDIC_PLAYWRIGHT_LOG`| test-runner log path                | `playwright.log`   |
/// | `MEDIC_BACKEND_LOG`   | backend log path                    | `backend.log`      |
/// | `MEDIC_AGENT_URL`     | classification service URL          | unset              |
/// | `MEDIC_AGENT_TOKEN`   | classification bearer token         | unset (degrades)   |
/// | `MEDIC_MAX_ATTEMPTS`  | attempt ceiling override            | unset              |
/// | `MEDIC_STATE_DIR`     | durable state directory             | `.medic`           |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub run_id: String,
    pub run_attempt: u32,
    pub job_name: String,
    pub branch: String,
    pub commit: String,
    pub status: String,
    pub playwright_log: PathBuf,
    pub backend_log: PathBuf,
    pub agent_url: Option<String>,
    pub agent_token: Option<String>,
    pub max_attempts_override: Option<u32>,
    pub state_dir: PathBuf,
}

impl EnvConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary lookup (tests use a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            run_id: get("GITHUB_RUN_ID").unwrap_or_else(|| "local".to_string()),
            run_attempt: get("GITHUB_RUN_ATTEMPT")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(1),
            job_name: get("GITHUB_JOB").unwrap_or_else(|| "e2e".to_string()),
            branch: get("GITHUB_REF_NAME").unwrap_or_default(),
            commit: get("GITHUB_SHA").unwrap_or_default(),
            status: get("MEDIC_RUN_STATUS").unwrap_or_else(|| "failure".to_string()),
            playwright_log: get("MEDIC_PLAYWRIGHT_LOG")
                .map_or_else(|| PathBuf::from("playwright.log"), PathBuf::from),
            backend_log: get("MEDIC_BACKEND_LOG")
                .map_or_else(|| PathBuf::from("backend.log"), PathBuf::from),
            agent_url: get("MEDIC_AGENT_URL"),
            agent_token: get("MEDIC_AGENT_TOKEN"),
            max_attempts_override: get("MEDIC_MAX_ATTEMPTS")
                .and_then(|value| value.trim().parse().ok()),
            state_dir: get("MEDIC_STATE_DIR")
                .map_or_else(|| PathBuf::from(".medic"), PathBuf::from),
        }
    }
}
