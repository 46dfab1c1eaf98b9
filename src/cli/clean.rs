//! Output tree removal.

use anyhow::{Context, Result, bail};
use std::fs;

use crate::config::ProjectConfig;
use crate::log;

/// Remove `build.output` recursively. An absent output is a no-op.
pub fn clean(config: &ProjectConfig) -> Result<()> {
    let output = &config.build.output;

    if config.get_root().starts_with(output) {
        bail!(
            "refusing to clean `{}`: it contains the project root",
            output.display()
        );
    }

    if !output.exists() {
        log!("clean"; "nothing to remove");
        return Ok(());
    }

    fs::remove_dir_all(output)
        .with_context(|| format!("failed to remove {}", output.display()))?;
    log!("clean"; "removed {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};

    #[test]
    fn test_clean_removes_output_tree() {
        let (_dir, config) = project("");
        write(&config.build.output, "css/main.css", "a{}");
        write(&config.build.output, "img/logo.png", b"png");

        clean(&config).unwrap();
        assert!(!config.build.output.exists());
        assert!(config.get_root().is_dir());
    }

    #[test]
    fn test_clean_missing_output_is_noop() {
        let (_dir, config) = project("");
        assert!(!config.build.output.exists());
        clean(&config).unwrap();
    }

    #[test]
    fn test_clean_refuses_output_containing_root() {
        let (_dir, config) = project("[build]\noutput = \"..\"\n");
        let err = clean(&config).unwrap_err();
        assert!(err.to_string().contains("refusing to clean"));
        assert!(config.get_root().is_dir());
    }
}
