//! Context document load/save with schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

use crate::core::types::RunContext;

const CONTEXT_SCHEMA: &str = include_str!("../../schemas/context.schema.json");

/// Load and validate the context document.
///
/// A missing or malformed document is an input error: downstream stages must
/// not guess at run identity.
pub fn load_context(path: &Path) -> Result<RunContext> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read context {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse context {}", path.display()))?;
    validate_schema(&value).with_context(|| format!("validate context {}", path.display()))?;
    let context: RunContext = serde_json::from_value(value)
        .with_context(|| format!("deserialize context {}", path.display()))?;
    Ok(context)
}

/// Atomically write the context document (temp file + rename).
pub fn write_context(path: &Path, context: &RunContext) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(context)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("context path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp context {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace context {}", path.display()))?;
    Ok(())
}

fn validate_schema(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(CONTEXT_SCHEMA).context("parse context schema")?;
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
