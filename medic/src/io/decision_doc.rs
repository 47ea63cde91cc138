//! Decision document load/save with schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::validator_for;
use serde_json::Value;

use crate::core::types::Decision;

const DECISION_SCHEMA: &str = include_str!("../../schemas/decision.schema.json");

/// Load and validate the decision document (schema + invariants).
pub fn load_decision(path: &Path) -> Result<Decision> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read decision {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse decision {}", path.display()))?;
    validate_schema(&value).with_context(|| format!("validate decision {}", path.display()))?;
    let decision: Decision = serde_json::from_value(value)
        .with_context(|| format!("deserialize decision {}", path.display()))?;
    validate_invariants(&decision)?;
    Ok(decision)
}

/// Atomically write the decision document (temp file + rename).
pub fn write_decision(path: &Path, decision: &Decision) -> Result<()> {
    validate_invariants(decision)?;
    let mut buf = serde_json::to_string_pretty(decision)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("decision path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp decision {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace decision {}", path.display()))?;
    Ok(())
}

/// Invariants that hold for every well-formed decision, wherever it came from.
fn validate_invariants(decision: &Decision) -> Result<()> {
    if !decision.allowed {
        if !decision.actions.is_empty() {
            bail!("disallowed decision must carry no actions");
        }
        if decision.rerun.is_some() {
            bail!("disallowed decision must carry no rerun plan");
        }
    }
    if let Some(rerun) = &decision.rerun {
        if !(1..=2).contains(&rerun.max_attempts) {
            bail!("rerun.max_attempts {} outside [1, 2]", rerun.max_attempts);
        }
    }
    Ok(())
}

fn validate_schema(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(DECISION_SCHEMA).context("parse decision schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!("schema validation failed: {}", messages.join("; ")));
    }
    Ok(())
}
