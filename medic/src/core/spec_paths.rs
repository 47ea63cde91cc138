//! Bounded extraction of failing spec paths from the test-runner log.

use std::sync::LazyLock;

use regex::Regex;

/// Ceiling on extracted paths, to bound downstream payload sizes.
pub const MAX_SPEC_PATHS: usize = 3;

static SPEC_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Playwright prints failing spec files as relative paths like
    // `tests/e2e/booking.spec.ts:12:5`. Only the file part is captured.
    Regex::new(r"[A-Za-z0-9_@][A-Za-z0-9_@./-]*\.spec\.[tj]sx?").expect("spec path regex")
});

/// Extract up to [`MAX_SPEC_PATHS`] distinct spec paths from a log, in first
/// occurrence order.
pub fn extract_spec_paths(log: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for found in SPEC_PATH_RE.find_iter(log) {
        let path = found.as_str().to_string();
        if !paths.contains(&path) {
            paths.push(path);
        }
        if paths.len() == MAX_SPEC_PATHS {
            break;
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paths_in_first_occurrence_order() {
        let log = "\
  1) tests/e2e/booking.spec.ts:12:5 › books a slot
  2) tests/e2e/login.spec.ts:3:1 › logs in
";
        assert_eq!(
            extract_spec_paths(log),
            vec!["tests/e2e/booking.spec.ts", "tests/e2e/login.spec.ts"]
        );
    }

    #[test]
    fn deduplicates_repeated_failures() {
        let log = "tests/e2e/a.spec.ts failed\ntests/e2e/a.spec.ts failed again\n";
        assert_eq!(extract_spec_paths(log), vec!["tests/e2e/a.spec.ts"]);
    }

    #[test]
    fn caps_at_three_paths() {
        let log = "\
e2e/a.spec.ts
e2e/b.spec.ts
e2e/c.spec.ts
e2e/d.spec.ts
";
        let paths = extract_spec_paths(log);
        assert_eq!(paths.len(), MAX_SPEC_PATHS);
        assert_eq!(paths, vec!["e2e/a.spec.ts", "e2e/b.spec.ts", "e2e/c.spec.ts"]);
    }

    #[test]
    fn empty_log_yields_no_paths() {
        assert!(extract_spec_paths("").is_empty());
        assert!(extract_spec_paths("nothing relevant here").is_empty());
    }
}
