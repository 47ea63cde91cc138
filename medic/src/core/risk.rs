//! Risk scoring for proposed code changes.
//!
//! Pure and deterministic: identical inputs always produce identical scores,
//! levels, and eligibility, which keeps the policy explainable after the fact.

use serde::{Deserialize, Serialize};

use crate::core::types::ErrorType;

/// Path prefixes classified as backend code.
const BACKEND_PREFIXES: &[&str] = &["backend/", "server/", "api/", "src/server/"];

/// Path prefixes classified as infrastructure.
const INFRA_PREFIXES: &[&str] = &[".github/", "infra/", "deploy/", "docker/", "config/"];

/// Path prefixes classified as test code.
const TEST_PREFIXES: &[&str] = &["tests/", "e2e/", "playwright/"];

/// Coarse change-scope classification of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathScope {
    Test,
    Backend,
    Infra,
    Other,
}

/// Classify a changed path into its scope bucket.
///
/// Infrastructure wins over everything (a compose file under `tests/` is
/// still infrastructure), backend wins over test markers (a spec file under
/// `backend/` is backend code).
pub fn classify_path(path: &str) -> PathScope {
    let path = path.trim_start_matches("./");
    let name = path.rsplit('/').next().unwrap_or(path);

    if INFRA_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) || is_config_file(name) {
        return PathScope::Infra;
    }
    if BACKEND_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return PathScope::Backend;
    }
    if TEST_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || path.contains("/__tests__/")
        || name.contains(".spec.")
        || name.contains(".test.")
    {
        return PathScope::Test;
    }
    PathScope::Other
}

fn is_config_file(name: &str) -> bool {
    name == "Dockerfile"
        || name.starts_with("docker-compose")
        || name.starts_with(".env")
        || name.ends_with(".yml")
        || name.ends_with(".yaml")
        || name.contains(".config.")
        || name == "package.json"
        || name == "package-lock.json"
}

/// Size of a proposed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub files_changed: u32,
    pub lines_total: u32,
}

/// A proposed change set plus the failure it is meant to fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub error_type: ErrorType,
    pub changed_files: Vec<String>,
    pub stats: ChangeStats,
    /// `Some(true)` validation passed, `Some(false)` failed, `None` not run.
    pub validation_ok: Option<bool>,
}

/// Ordinal risk buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Result of scoring a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: i32,
    pub level: RiskLevel,
    /// Human-readable score contributions, in evaluation order.
    pub factors: Vec<String>,
    pub auto_merge_eligible: bool,
}

/// Auto-merge size bounds, intentionally stricter than the scoring tiers: a
/// change can score `low` and still be denied on size alone.
const AUTO_MERGE_MAX_FILES: u32 = 3;
const AUTO_MERGE_MAX_LINES: u32 = 100;

/// Score a change set and derive auto-merge eligibility.
pub fn assess(change: &ChangeSet) -> RiskAssessment {
    let mut score = 0i32;
    let mut factors = Vec::new();

    let error_cost = match change.error_type {
        ErrorType::FrontendSelector => 1,
        ErrorType::FrontendTiming => 2,
        _ => 5,
    };
    score += error_cost;
    factors.push(format!(
        "error type {} (+{})",
        change.error_type.as_str(),
        error_cost
    ));

    let scopes: Vec<PathScope> = change
        .changed_files
        .iter()
        .map(|path| classify_path(path))
        .collect();
    let any_infra = scopes.contains(&PathScope::Infra);
    let any_backend = scopes.contains(&PathScope::Backend);
    let test_only = scopes.iter().all(|scope| *scope == PathScope::Test);

    let (scope_cost, scope_label) = if any_infra {
        (10, "infrastructure or config touched (+10)")
    } else if change.changed_files.is_empty() {
        (0, "no files touched (+0)")
    } else if test_only {
        (0, "test files only (+0)")
    } else if any_backend {
        (3, "backend code touched (+3)")
    } else {
        (3, "application code outside tests touched (+3)")
    };
    score += scope_cost;
    factors.push(scope_label.to_string());

    let files = change.stats.files_changed;
    let lines = change.stats.lines_total;
    let size_cost = if files == 0 {
        0
    } else if files <= 2 && lines <= 50 {
        1
    } else if files <= 4 && lines <= 150 {
        2
    } else {
        5
    };
    score += size_cost;
    factors.push(format!("size {files} files / {lines} lines (+{size_cost})"));

    let validation_cost = match change.validation_ok {
        Some(true) => -2,
        Some(false) => 3,
        None => 0,
    };
    score += validation_cost;
    factors.push(match change.validation_ok {
        Some(true) => "validation passed (-2)".to_string(),
        Some(false) => "validation failed (+3)".to_string(),
        None => "validation not attempted (+0)".to_string(),
    });

    let level = level_for(score);
    // Eligibility is a separate, stricter policy than the score: low level,
    // test-only scope, tight size bounds, and validation that did not fail.
    let auto_merge_eligible = level == RiskLevel::Low
        && test_only
        && files <= AUTO_MERGE_MAX_FILES
        && lines <= AUTO_MERGE_MAX_LINES
        && change.validation_ok != Some(false);

    RiskAssessment {
        score,
        level,
        factors,
        auto_merge_eligible,
    }
}

fn level_for(score: i32) -> RiskLevel {
    if score <= 2 {
        RiskLevel::Low
    } else if score <= 5 {
        RiskLevel::Medium
    } else if score <= 10 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(
        error_type: ErrorType,
        files: Vec<&str>,
        files_changed: u32,
        lines_total: u32,
        validation_ok: Option<bool>,
    ) -> ChangeSet {
        ChangeSet {
            error_type,
            changed_files: files.into_iter().map(String::from).collect(),
            stats: ChangeStats {
                files_changed,
                lines_total,
            },
            validation_ok,
        }
    }

    #[test]
    fn small_validated_selector_fix_is_low_and_eligible() {
        let assessment = assess(&change(
            ErrorType::FrontendSelector,
            vec!["tests/e2e/a.spec"],
            1,
            10,
            Some(true),
        ));
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(assessment.auto_merge_eligible);
    }

    #[test]
    fn backend_touch_costs_three_and_blocks_auto_merge() {
        let assessment = assess(&change(
            ErrorType::FrontendSelector,
            vec!["tests/e2e/a.spec", "backend/src/service.ts"],
            2,
            50,
            Some(true),
        ));
        assert_eq!(assessment.score, 3);
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert!(!assessment.auto_merge_eligible);
    }

    #[test]
    fn unknown_error_with_infra_change_and_failed_validation_is_critical() {
        let assessment = assess(&change(
            ErrorType::Unknown,
            vec![".github/workflows/ci.yml"],
            1,
            100,
            Some(false),
        ));
        assert_eq!(assessment.score, 20);
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert!(!assessment.auto_merge_eligible);
    }

    #[test]
    fn assessment_is_deterministic() {
        let input = change(
            ErrorType::FrontendTiming,
            vec!["tests/e2e/a.spec.ts", "tests/e2e/b.spec.ts"],
            2,
            40,
            None,
        );
        let first = assess(&input);
        let second = assess(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn score_can_go_negative_and_stays_low() {
        // 1 (selector) + 0 (test-only) + 0 (no files counted) - 2 (validated)
        let assessment = assess(&change(ErrorType::FrontendSelector, vec![], 0, 0, Some(true)));
        assert_eq!(assessment.score, -1);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn low_score_is_still_denied_auto_merge_on_size() {
        // 4 files / 120 lines scores +2 but exceeds the eligibility bounds.
        let assessment = assess(&change(
            ErrorType::FrontendSelector,
            vec![
                "tests/e2e/a.spec.ts",
                "tests/e2e/b.spec.ts",
                "tests/e2e/c.spec.ts",
                "tests/e2e/d.spec.ts",
            ],
            4,
            120,
            Some(true),
        ));
        assert_eq!(assessment.score, 1);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(!assessment.auto_merge_eligible);
    }

    #[test]
    fn config_files_classify_as_infra_wherever_they_live() {
        assert_eq!(classify_path("tests/docker-compose.yml"), PathScope::Infra);
        assert_eq!(classify_path("playwright.config.ts"), PathScope::Infra);
        assert_eq!(classify_path(".github/workflows/e2e.yml"), PathScope::Infra);
    }

    #[test]
    fn spec_files_under_backend_stay_backend() {
        assert_eq!(classify_path("backend/tests/api.spec.ts"), PathScope::Backend);
        assert_eq!(classify_path("tests/e2e/login.spec.ts"), PathScope::Test);
        assert_eq!(classify_path("src/components/Nav.tsx"), PathScope::Other);
    }
}
