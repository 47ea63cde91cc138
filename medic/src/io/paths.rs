//! Canonical locations of the durable documents under the state directory.

use std::path::{Path, PathBuf};

/// All medic-owned paths for one workspace.
#[derive(Debug, Clone)]
pub struct MedicPaths {
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub context_path: PathBuf,
    pub decision_path: PathBuf,
    pub attempt_state_path: PathBuf,
    pub report_path: PathBuf,
    pub fix_brief_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl MedicPaths {
    pub fn new(root: &Path, state_dir: &Path) -> Self {
        let state_dir = root.join(state_dir);
        Self {
            config_path: state_dir.join("config.toml"),
            context_path: state_dir.join("context.json"),
            decision_path: state_dir.join("decision.json"),
            attempt_state_path: state_dir.join("attempt_state.json"),
            report_path: state_dir.join("report.json"),
            fix_brief_path: state_dir.join("fix_brief.md"),
            logs_dir: state_dir.join("logs"),
            state_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_in_the_state_dir() {
        let paths = MedicPaths::new(Path::new("/work"), Path::new(".medic"));
        assert_eq!(paths.state_dir, Path::new("/work/.medic"));
        assert!(paths.context_path.ends_with(".medic/context.json"));
        assert!(paths.decision_path.ends_with(".medic/decision.json"));
        assert!(paths.attempt_state_path.ends_with(".medic/attempt_state.json"));
        assert!(paths.report_path.ends_with(".medic/report.json"));
        assert!(paths.logs_dir.ends_with(".medic/logs"));
    }
}
