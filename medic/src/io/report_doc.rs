//! Report document save/load.
//!
//! The report is the sole externally observable outcome of a heal pass. It is
//! written exactly once per invocation, last, and overwritten (not appended)
//! when the same run is executed again.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::types::Report;

/// Atomically write the report document (temp file + rename).
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    debug!(run_id = %report.run_id, status = ?report.status, "writing report");
    let mut buf = serde_json::to_string_pretty(report)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("report path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp report {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace report {}", path.display()))?;
    Ok(())
}

/// Load a report back from disk.
pub fn load_report(path: &Path) -> Result<Report> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read report {}", path.display()))?;
    let report: Report = serde_json::from_str(&contents)
        .with_context(|| format!("parse report {}", path.display()))?;
    Ok(report)
}
