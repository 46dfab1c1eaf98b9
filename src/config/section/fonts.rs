//! `[fonts]` and `[html]` section configuration.
//!
//! ```toml
//! [fonts]
//! sources = ["fonts/**/*.*"]
//! output = "fonts"            # Relative to build output
//!
//! [html]
//! sources = ["../*.html"]     # Watched for full page reloads
//! ```

use super::{strings, validate_globs};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    pub sources: Vec<String>,
    pub output: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["fonts/**/*.*"]),
            output: "fonts".into(),
        }
    }
}

impl FontsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("fonts.sources"), &self.sources, diag);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub sources: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["../*.html"]),
        }
    }
}

impl HtmlConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("html.sources"), &self.sources, diag);
    }
}
