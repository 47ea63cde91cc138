//! Tool configuration stored under `.medic/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::patch_gate::GatePolicy;

/// Medic configuration (TOML).
///
/// This file is intended to be committed alongside the test suite and must
/// remain stable and automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MedicConfig {
    /// Command that restores the baseline e2e dataset. Must be a full,
    /// idempotent restore, safe to run repeatedly.
    pub reseed_command: Vec<String>,

    /// Command that regenerates browser storage state (login session).
    pub storage_state_command: Vec<String>,

    /// Base command for the validating rerun; spec paths are appended when
    /// the rerun is scoped.
    pub rerun_command: Vec<String>,

    /// Default attempt ceiling, clamped into [1, 2] at decision time.
    pub max_attempts_default: u32,

    /// Per-action wall-clock budget in seconds.
    pub action_timeout_secs: u64,

    /// Classification request timeout in seconds.
    pub classify_timeout_secs: u64,

    /// Truncate action stdout/stderr logs beyond this many bytes.
    pub output_limit_bytes: usize,

    pub patch: PatchConfig,
}

/// Patch safety gate knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PatchConfig {
    /// Ceiling on total patch lines.
    pub max_lines: usize,
    /// Allowed path prefixes for touched files.
    pub allowed_prefixes: Vec<String>,
}

impl Default for PatchConfig {
    fn default() -> Self {
        let policy = GatePolicy::default();
        Self {
            max_lines: policy.max_lines,
            allowed_prefixes: policy.allowed_prefixes,
        }
    }
}

impl PatchConfig {
    pub fn to_policy(&self) -> GatePolicy {
        GatePolicy {
            max_lines: self.max_lines,
            allowed_prefixes: self.allowed_prefixes.clone(),
        }
    }
}

impl Default for MedicConfig {
    fn default() -> Self {
        Self {
            reseed_command: vec![
                "npm".to_string(),
                "run".to_string(),
                "seed:e2e".to_string(),
            ],
            storage_state_command: vec![
                "npm".to_string(),
                "run".to_string(),
                "e2e:storage-state".to_string(),
            ],
            rerun_command: vec![
                "npx".to_string(),
                "playwright".to_string(),
                "test".to_string(),
            ],
            max_attempts_default: 2,
            action_timeout_secs: 15 * 60,
            classify_timeout_secs: 60,
            output_limit_bytes: 1_000_000,
            patch: PatchConfig::default(),
        }
    }
}

impl MedicConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, command) in [
            ("reseed_command", &self.reseed_command),
            ("storage_state_command", &self.storage_state_command),
            ("rerun_command", &self.rerun_command),
        ] {
            if command.is_empty() || command[0].trim().is_empty() {
                return Err(anyhow!("{name} must be a non-empty array"));
            }
        }
        if self.max_attempts_default == 0 {
            return Err(anyhow!("max_attempts_default must be > 0"));
        }
        if self.action_timeout_secs == 0 {
            return Err(anyhow!("action_timeout_secs must be > 0"));
        }
        if self.classify_timeout_secs == 0 {
            return Err(anyhow!("classify_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.patch.max_lines == 0 {
            return Err(anyhow!("patch.max_lines must be > 0"));
        }
        if self.patch.allowed_prefixes.is_empty() {
            return Err(anyhow!("patch.allowed_prefixes must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MedicConfig::default()`.
pub fn load_config(path: &Path) -> Result<MedicConfig> {
    if !path.exists() {
        let cfg = MedicConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MedicConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MedicConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf).with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, MedicConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = MedicConfig::default();
        cfg.max_attempts_default = 1;
        cfg.patch.max_lines = 120;
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_attempts_default = 1\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_attempts_default, 1);
        assert_eq!(cfg.rerun_command, MedicConfig::default().rerun_command);
    }

    #[test]
    fn empty_command_is_rejected() {
        let mut cfg = MedicConfig::default();
        cfg.rerun_command = vec![];
        assert!(cfg.validate().is_err());
    }
}
