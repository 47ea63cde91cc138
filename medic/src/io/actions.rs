//! Remediation action execution.
//!
//! The [`ActionRunner`] trait decouples the heal orchestration from real
//! process spawning. Tests use scripted runners that return predetermined
//! outcomes without touching the system.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::core::types::{ActionKind, ActionOutcome};
use crate::io::process::run_command_with_timeout;

/// Parameters for one action invocation.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Working directory for the action process.
    pub workdir: PathBuf,
    /// File to write the action's combined stdout/stderr log to.
    pub log_path: PathBuf,
    /// Wall-clock budget for the action.
    pub timeout: Duration,
    /// Truncate captured output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Abstraction over action execution backends.
pub trait ActionRunner {
    /// Run `command` for `kind` and report the outcome. Errors are reserved
    /// for infrastructure failures; a failing command is an `ok = false`
    /// outcome, not an error.
    fn run(&self, kind: ActionKind, command: &[String], request: &ActionRequest)
    -> Result<ActionOutcome>;
}

/// Runner that spawns the configured command.
pub struct CommandActionRunner;

impl ActionRunner for CommandActionRunner {
    fn run(
        &self,
        kind: ActionKind,
        command: &[String],
        request: &ActionRequest,
    ) -> Result<ActionOutcome> {
        let program = command
            .first()
            .ok_or_else(|| anyhow!("empty command for action {}", kind.as_str()))?;
        info!(action = kind.as_str(), command = ?command, "running action");

        let mut cmd = Command::new(program);
        cmd.args(&command[1..]).current_dir(&request.workdir);

        let output = match run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes)
        {
            Ok(output) => output,
            Err(err) => {
                // Spawn failures (missing binary, bad workdir) are recorded
                // like any other action failure so the remaining plan runs.
                write_action_log(&request.log_path, &format!("failed to start: {err:#}\n"))?;
                return Ok(ActionOutcome {
                    kind,
                    ok: false,
                    exit_code: None,
                    command: Some(command.to_vec()),
                    log_path: Some(request.log_path.display().to_string()),
                    note: Some(format!("failed to start: {err}")),
                });
            }
        };

        write_action_log(&request.log_path, &output.render_log())?;
        let ok = output.status.success() && !output.timed_out;
        debug!(action = kind.as_str(), ok, exit_code = ?output.status.code(), "action finished");

        Ok(ActionOutcome {
            kind,
            ok,
            exit_code: output.status.code(),
            command: Some(command.to_vec()),
            log_path: Some(request.log_path.display().to_string()),
            note: output.timed_out.then(|| "timed out".to_string()),
        })
    }
}

fn write_action_log(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create action log dir {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write action log {}", path.display()))
}
