//! Durable attempt counter, keyed by run id.
//!
//! This is the only cross-invocation mutable state in the pipeline. Writes go
//! through a temp file + rename so a rerun that races a crashed predecessor
//! never observes a half-written counter.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted attempt bookkeeping (`.medic/attempt_state.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptState {
    /// Run the counter belongs to.
    pub run_id: String,
    /// Remediation attempts consumed for this run.
    pub attempts: u32,
}

impl AttemptState {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            attempts: 0,
        }
    }
}

/// Load attempt state for `run_id`.
///
/// A missing file yields a fresh counter. A stored counter for a different
/// run id is discarded and reset to zero: attempts never carry across runs.
/// A present-but-malformed file is an input error and fails the invocation.
pub fn load_attempt_state(path: &Path, run_id: &str) -> Result<AttemptState> {
    if !path.exists() {
        debug!(run_id, "no attempt state on disk, starting fresh");
        return Ok(AttemptState::new(run_id));
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read attempt state {}", path.display()))?;
    let state: AttemptState = serde_json::from_str(&contents)
        .with_context(|| format!("parse attempt state {}", path.display()))?;
    if state.run_id != run_id {
        debug!(
            stored = %state.run_id,
            current = %run_id,
            "attempt state belongs to a different run, resetting"
        );
        return Ok(AttemptState::new(run_id));
    }
    debug!(run_id, attempts = state.attempts, "attempt state loaded");
    Ok(state)
}

/// Atomically write attempt state to disk (temp file + rename).
pub fn write_attempt_state(path: &Path, state: &AttemptState) -> Result<()> {
    debug!(run_id = %state.run_id, attempts = state.attempts, "writing attempt state");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("attempt state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp attempt state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace attempt state {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_at_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state =
            load_attempt_state(&temp.path().join("attempt_state.json"), "run-1").expect("load");
        assert_eq!(state, AttemptState::new("run-1"));
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("attempt_state.json");
        let state = AttemptState {
            run_id: "run-7".to_string(),
            attempts: 2,
        };
        write_attempt_state(&path, &state).expect("write");
        let loaded = load_attempt_state(&path, "run-7").expect("load");
        assert_eq!(loaded, state);
    }

    #[test]
    fn different_run_id_resets_the_counter() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("attempt_state.json");
        write_attempt_state(
            &path,
            &AttemptState {
                run_id: "run-old".to_string(),
                attempts: 2,
            },
        )
        .expect("write");

        let loaded = load_attempt_state(&path, "run-new").expect("load");
        assert_eq!(loaded, AttemptState::new("run-new"));
    }

    #[test]
    fn malformed_state_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("attempt_state.json");
        fs::write(&path, "{not json").expect("write");
        let err = load_attempt_state(&path, "run-1").unwrap_err();
        assert!(err.to_string().contains("parse attempt state"));
    }

    #[test]
    fn no_temp_file_is_left_behind() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("attempt_state.json");
        write_attempt_state(&path, &AttemptState::new("run-1")).expect("write");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
