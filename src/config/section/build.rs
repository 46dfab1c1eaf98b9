//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! output = "../project/www"   # Output root (relative to project root)
//! maps = "maps"               # Source map directory (relative to output)
//! ordered = true              # Honor task dependency edges
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::task::TaskKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root for every task.
    pub output: PathBuf,

    /// Source map directory.
    pub maps: PathBuf,

    /// Run sprite and icon before style, sprite before image.
    /// `false` runs all tasks in a single parallel batch.
    pub ordered: bool,

    /// Subset of tasks selected with `--only` (empty = all).
    #[serde(skip)]
    pub only: Vec<TaskKind>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "../project/www".into(),
            maps: "maps".into(),
            ordered: true,
            only: Vec::new(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.output.as_os_str().is_empty() {
            diag.error(FieldPath::new("build.output"), "output directory must not be empty");
        }
    }

    /// Tasks selected for this invocation.
    pub fn selected_tasks(&self) -> Vec<TaskKind> {
        if self.only.is_empty() {
            TaskKind::ALL.to_vec()
        } else {
            TaskKind::ALL
                .into_iter()
                .filter(|kind| self.only.contains(kind))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use crate::task::TaskKind;
    use std::path::PathBuf;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.output, PathBuf::from("../project/www"));
        assert_eq!(config.build.maps, PathBuf::from("maps"));
        assert!(config.build.ordered);
        assert_eq!(config.build.selected_tasks().len(), 7);
    }

    #[test]
    fn test_selected_tasks_keep_aggregate_order() {
        let mut config = test_parse_config("[build]\nordered = false");
        config.build.only = vec![TaskKind::Image, TaskKind::Style];
        assert!(!config.build.ordered);
        assert_eq!(config.build.selected_tasks(), vec![TaskKind::Style, TaskKind::Image]);
    }
}
