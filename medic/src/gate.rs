//! Orchestration for `medic gate`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::patch_gate::{PatchVerdict, check_patch};
use crate::io::config::load_config;
use crate::io::env::EnvConfig;
use crate::io::paths::MedicPaths;

/// Structurally validate a patch file against the configured gate policy.
///
/// Runs before any attempt to apply the patch and independently of the risk
/// assessor. A rejection is a successful, terminal verdict, not an error.
pub fn run_gate(root: &Path, env: &EnvConfig, patch_path: &Path) -> Result<PatchVerdict> {
    let paths = MedicPaths::new(root, &env.state_dir);
    let cfg = load_config(&paths.config_path)?;
    let patch = fs::read_to_string(patch_path)
        .with_context(|| format!("read patch {}", patch_path.display()))?;

    let verdict = check_patch(&patch, &cfg.patch.to_policy());
    info!(
        ok = verdict.ok,
        touched_files = verdict.touched_files.len(),
        line_count = verdict.line_count,
        "patch gate evaluated"
    );
    Ok(verdict)
}
