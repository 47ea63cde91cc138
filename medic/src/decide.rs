//! Orchestration for `medic decide`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::decision::{DecisionPolicy, decide};
use crate::core::types::Decision;
use crate::io::config::load_config;
use crate::io::context_doc::load_context;
use crate::io::decision_doc::write_decision;
use crate::io::env::EnvConfig;
use crate::io::paths::MedicPaths;

/// Derive the decision document from the context document.
///
/// A missing or malformed context is fatal: deciding without a context would
/// mean guessing at run identity and failure class.
pub fn run_decide(root: &Path, env: &EnvConfig) -> Result<Decision> {
    let paths = MedicPaths::new(root, &env.state_dir);
    let context = load_context(&paths.context_path)
        .context("load context document (run `medic prepare` first)")?;
    let cfg = load_config(&paths.config_path)?;

    let policy = DecisionPolicy {
        max_attempts: env
            .max_attempts_override
            .unwrap_or(cfg.max_attempts_default),
        rerun_command: cfg.rerun_command.clone(),
    };
    let decision = decide(&context, &policy);
    write_decision(&paths.decision_path, &decision)?;

    info!(
        run_id = %decision.run_id,
        error_type = decision.error_type.as_str(),
        allowed = decision.allowed,
        actions = decision.actions.len(),
        "decision written"
    );
    Ok(decision)
}
