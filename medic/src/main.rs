//! CI self-healing orchestrator CLI.
//!
//! Each subcommand is one stateless CI job step. Commands communicate only
//! through durable JSON documents under `.medic/`, so any of them can be
//! re-invoked by a workflow rerun without in-process state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medic::assess::run_assess;
use medic::decide::run_decide;
use medic::exit_codes;
use medic::gate::run_gate;
use medic::heal::run_heal;
use medic::io::actions::CommandActionRunner;
use medic::io::classify::CloudClassifier;
use medic::io::config::load_config;
use medic::io::env::EnvConfig;
use medic::io::paths::MedicPaths;
use medic::prepare::run_prepare;

#[derive(Parser)]
#[command(
    name = "medic",
    version,
    about = "CI self-healing orchestrator for end-to-end test runs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect run metadata and logs, classify the failure, write `.medic/context.json`.
    Prepare,
    /// Derive a bounded self-heal plan from the context document.
    Decide,
    /// Execute the plan under attempt guardrails and write `.medic/report.json`.
    Heal,
    /// Score a proposed change set and derive auto-merge eligibility.
    Assess {
        /// Path to the change set JSON document.
        #[arg(long)]
        changeset: PathBuf,
    },
    /// Structurally validate a generated patch before it is applied.
    Gate {
        /// Path to the unified-diff patch file.
        #[arg(long)]
        patch: PathBuf,
    },
}

fn main() {
    medic::logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve working directory")?;
    let env = EnvConfig::from_env();
    match cli.command {
        Command::Prepare => cmd_prepare(&root, &env),
        Command::Decide => cmd_decide(&root, &env),
        Command::Heal => cmd_heal(&root, &env),
        Command::Assess { changeset } => cmd_assess(&changeset),
        Command::Gate { patch } => cmd_gate(&root, &env, &patch),
    }
}

fn cmd_prepare(root: &Path, env: &EnvConfig) -> Result<()> {
    let paths = MedicPaths::new(root, &env.state_dir);
    let cfg = load_config(&paths.config_path)?;
    // Missing credentials degrade to an unclassified context, never an error.
    let classifier = match (&env.agent_url, &env.agent_token) {
        (Some(url), Some(token)) => Some(CloudClassifier::new(
            url.clone(),
            token.clone(),
            Duration::from_secs(cfg.classify_timeout_secs),
        )?),
        _ => None,
    };
    let outcome = run_prepare(root, env, classifier.as_ref())?;
    println!(
        "context written to {} (classified: {})",
        outcome.context_path.display(),
        outcome.classified
    );
    Ok(())
}

fn cmd_decide(root: &Path, env: &EnvConfig) -> Result<()> {
    let decision = run_decide(root, env)?;
    println!(
        "decision: allowed={} error_type={} actions={}",
        decision.allowed,
        decision.error_type.as_str(),
        decision.actions.len()
    );
    Ok(())
}

fn cmd_heal(root: &Path, env: &EnvConfig) -> Result<()> {
    let report = run_heal(root, env, &CommandActionRunner)?;
    match report.reason {
        Some(reason) => println!("heal pass: {} ({:?})", report.status.as_str(), reason),
        None => println!("heal pass: {}", report.status.as_str()),
    }
    Ok(())
}

fn cmd_assess(changeset: &Path) -> Result<()> {
    let assessment = run_assess(changeset)?;
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

fn cmd_gate(root: &Path, env: &EnvConfig, patch: &Path) -> Result<()> {
    let verdict = run_gate(root, env, patch)?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prepare() {
        let cli = Cli::parse_from(["medic", "prepare"]);
        assert!(matches!(cli.command, Command::Prepare));
    }

    #[test]
    fn parse_assess_requires_changeset() {
        let cli = Cli::parse_from(["medic", "assess", "--changeset", "change.json"]);
        match cli.command {
            Command::Assess { changeset } => {
                assert_eq!(changeset, PathBuf::from("change.json"));
            }
            _ => panic!("expected assess"),
        }
        assert!(Cli::try_parse_from(["medic", "assess"]).is_err());
    }

    #[test]
    fn parse_gate_takes_patch_path() {
        let cli = Cli::parse_from(["medic", "gate", "--patch", "fix.patch"]);
        assert!(matches!(cli.command, Command::Gate { .. }));
    }
}
