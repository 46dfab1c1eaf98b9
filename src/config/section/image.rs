//! `[image]` section configuration.
//!
//! ```toml
//! [image]
//! sources = ["img/**/*.*"]
//! output = "img"          # Relative to build output; sub-paths are preserved
//! optimize = true         # false copies files unchanged
//! jpeg_quality = 85
//! ```

use super::{strings, validate_globs};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub sources: Vec<String>,
    pub output: PathBuf,
    pub optimize: bool,
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["img/**/*.*"]),
            output: "img".into(),
            optimize: true,
            jpeg_quality: 85,
        }
    }
}

impl ImageConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("image.sources"), &self.sources, diag);
        if !(1..=100).contains(&self.jpeg_quality) {
            diag.error(FieldPath::new("image.jpeg_quality"), "must be between 1 and 100");
        }
    }
}
