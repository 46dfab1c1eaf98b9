//! `[script]` section configuration.
//!
//! ```toml
//! [script]
//! sources = ["lib/*.*"]   # Entry modules, run in sorted order
//! output = "js/app.js"    # Bundle path (relative to build output)
//! minify = true
//! mangle = true
//! sourcemap = true
//! ```

use super::{strings, validate_globs};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub sources: Vec<String>,
    pub output: PathBuf,
    pub minify: bool,
    /// Rename local identifiers (only with `minify`).
    pub mangle: bool,
    pub sourcemap: bool,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["lib/*.*"]),
            output: "js/app.js".into(),
            minify: true,
            mangle: true,
            sourcemap: true,
        }
    }
}

impl ScriptConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("script.sources"), &self.sources, diag);
    }
}
