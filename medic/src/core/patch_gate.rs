//! Structural validation of generated patches.
//!
//! The gate runs before any attempt to apply a patch and is independent of
//! the risk assessor: a patch can be structurally safe yet too risky to
//! auto-merge, and the two verdicts are never conflated.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Structural constraints a patch must satisfy before it may be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Ceiling on total patch lines, headers included.
    pub max_lines: usize,
    /// Touched files must fall under one of these prefixes.
    pub allowed_prefixes: Vec<String>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_lines: 200,
            allowed_prefixes: vec![
                "tests/".to_string(),
                "e2e/".to_string(),
                "playwright/".to_string(),
            ],
        }
    }
}

/// Verdict of the patch safety gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchVerdict {
    pub ok: bool,
    /// Every violated constraint; empty when `ok`.
    pub reasons: Vec<String>,
    /// Files parsed from the diff headers, sorted and deduplicated.
    pub touched_files: Vec<String>,
    pub line_count: usize,
}

/// Validate a unified-diff patch against the gate policy.
///
/// All violations are collected so a rejected patch reports every problem at
/// once rather than failing one constraint at a time.
pub fn check_patch(patch: &str, policy: &GatePolicy) -> PatchVerdict {
    let mut reasons = Vec::new();

    let line_count = patch.lines().count();
    let has_markers = patch.lines().any(|line| {
        line.starts_with("--- ") || line.starts_with("+++ ") || line.starts_with("@@ ")
    });

    if patch.trim().is_empty() {
        reasons.push("patch is empty".to_string());
    } else if !has_markers {
        reasons.push("patch has no unified diff markers".to_string());
    }

    if line_count > policy.max_lines {
        reasons.push(format!(
            "patch is {} lines, over the {}-line ceiling",
            line_count, policy.max_lines
        ));
    }

    let touched_files = touched_files(patch);
    for file in &touched_files {
        let allowed = policy
            .allowed_prefixes
            .iter()
            .any(|prefix| file.starts_with(prefix));
        if !allowed {
            reasons.push(format!("{file} is outside the allowed paths"));
        }
    }

    PatchVerdict {
        ok: reasons.is_empty(),
        reasons,
        touched_files,
        line_count,
    }
}

/// Extract touched file paths from `---`/`+++`/`diff --git` headers, with the
/// `a/`/`b/` prefixes and any timestamp suffix stripped.
fn touched_files(patch: &str) -> Vec<String> {
    let mut files = BTreeSet::new();
    for line in patch.lines() {
        if let Some(rest) = line.strip_prefix("--- ") {
            insert_header_path(&mut files, rest, "a/");
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            insert_header_path(&mut files, rest, "b/");
        } else if let Some(rest) = line.strip_prefix("diff --git ") {
            for part in rest.split_whitespace() {
                let path = part.trim_start_matches("a/").trim_start_matches("b/");
                if !path.is_empty() {
                    files.insert(path.to_string());
                }
            }
        }
    }
    files.into_iter().collect()
}

fn insert_header_path(files: &mut BTreeSet<String>, raw: &str, marker: &str) {
    let mut path = raw.trim_start_matches(marker);
    // Header lines may carry a tab-separated timestamp suffix.
    if let Some(tab) = path.find('\t') {
        path = &path[..tab];
    }
    let path = path.trim();
    if path.is_empty() || path == "/dev/null" {
        return;
    }
    files.insert(path.to_string());
}
