//! One-shot aggregate build.

use anyhow::{Result, bail};

use crate::config::ProjectConfig;
use crate::task::runner::{BuildSummary, run_build};
use crate::utils::plural_s;

/// Run every selected task once, failing when any task failed.
pub fn build(config: &ProjectConfig) -> Result<BuildSummary> {
    let summary = run_build(config)?;
    let failed = summary.failed();
    if !failed.is_empty() {
        let names: Vec<_> = failed.iter().map(|k| k.name()).collect();
        bail!(
            "{} task{} failed: {}",
            failed.len(),
            plural_s(failed.len()),
            names.join(", ")
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;
    use crate::task::testing::{project, write};

    #[test]
    fn test_build_succeeds_for_passing_tasks() {
        let (_dir, mut config) = project("");
        write(config.get_root(), "fonts/a.woff2", b"font");
        config.build.only = vec![TaskKind::Fonts];

        let summary = build(&config).unwrap();
        assert!(summary.is_success());
        assert_eq!(summary.runs.len(), 1);
        assert!(config.fonts.output.join("a.woff2").is_file());
    }

    #[test]
    fn test_build_fails_when_a_task_fails() {
        let (_dir, mut config) = project("");
        write(config.get_root(), "lib/broken.js", "var x = ;\n");
        config.build.only = vec![TaskKind::Script];

        let err = build(&config).unwrap_err();
        assert!(err.to_string().contains("1 task failed: script"));
    }
}
