//! `[style]` section configuration.
//!
//! ```toml
//! [style]
//! sources = ["css/*.scss"]            # Entry globs (files starting with `_` are partials)
//! output = "css/main.css"             # Bundle path (relative to build output)
//! compiler = ["sass", "--stdin", "--no-source-map", "--load-path=$KILN_STYLE_DIR"]
//! browsers = ["> 1% in SE", "ie >= 6", "last 2 versions", "Firefox ESR", "Opera 12.1"]
//! minify = true
//! sourcemap = true
//! ```

use super::{strings, validate_command, validate_globs};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub sources: Vec<String>,

    pub output: PathBuf,

    /// Command that reads SCSS on stdin and prints CSS on stdout.
    /// Used for `.scss`/`.sass` entries; plain `.css` skips it.
    pub compiler: Vec<String>,

    /// Browserslist queries for vendor prefixing.
    pub browsers: Vec<String>,

    pub minify: bool,

    pub sourcemap: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["css/*.scss"]),
            output: "css/main.css".into(),
            compiler: strings(&[
                "sass",
                "--stdin",
                "--no-source-map",
                "--load-path=$KILN_STYLE_DIR",
            ]),
            browsers: strings(&[
                "> 1% in SE",
                "ie >= 6",
                "last 2 versions",
                "Firefox ESR",
                "Opera 12.1",
            ]),
            minify: true,
            sourcemap: true,
        }
    }
}

impl StyleConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("style.sources"), &self.sources, diag);
        validate_command(FieldPath::new("style.compiler"), &self.compiler, diag);
        if !self.browsers.is_empty()
            && let Err(e) = lightningcss::targets::Browsers::from_browserslist(&self.browsers)
        {
            diag.error(FieldPath::new("style.browsers"), format!("invalid browserslist query: {e}"));
        }
    }
}
