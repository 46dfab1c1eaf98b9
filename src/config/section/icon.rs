//! `[icon]` section configuration.
//!
//! Builds an icon font from SVG glyphs plus a stylesheet mapping
//! `.icon-<name>` classes to codepoints.
//!
//! ```toml
//! [icon]
//! sources = ["icons/*.svg"]
//! font_name = "killer"
//! font_dir = "fonts"              # Font binaries (relative to build output)
//! stylesheet = "css/killer.scss"  # Generated SCSS (relative to project root)
//! font_url = "../fonts/"          # URL prefix used in @font-face
//! class_prefix = "icon-"
//! start_codepoint = 0xE001
//! formats = ["woff2", "woff"]
//! generator = ["fantasticon", "--config", "$KILN_ICON_CONFIG"]
//! ```

use super::{strings, validate_command, validate_globs};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// First codepoint of the Unicode private use area.
const PRIVATE_USE_START: u32 = 0xE000;
const PRIVATE_USE_END: u32 = 0xF8FF;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub sources: Vec<String>,
    pub font_name: String,
    pub font_dir: PathBuf,
    pub stylesheet: PathBuf,
    pub font_url: String,
    pub class_prefix: String,
    pub start_codepoint: u32,
    pub formats: Vec<String>,

    /// Font generator command; an empty list only writes the stylesheet.
    pub generator: Vec<String>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["icons/*.svg"]),
            font_name: "killer".into(),
            font_dir: "fonts".into(),
            stylesheet: "css/killer.scss".into(),
            font_url: "../fonts/".into(),
            class_prefix: "icon-".into(),
            start_codepoint: 0xE001,
            formats: strings(&["woff2", "woff"]),
            generator: strings(&["fantasticon", "--config", "$KILN_ICON_CONFIG"]),
        }
    }
}

impl IconConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("icon.sources"), &self.sources, diag);
        validate_command(FieldPath::new("icon.generator"), &self.generator, diag);

        if self.font_name.trim().is_empty() {
            diag.error(FieldPath::new("icon.font_name"), "font name must not be empty");
        }
        if !(PRIVATE_USE_START..=PRIVATE_USE_END).contains(&self.start_codepoint) {
            diag.error_with_hint(
                FieldPath::new("icon.start_codepoint"),
                format!("U+{:04X} is outside the private use area", self.start_codepoint),
                "use a value between 0xE000 and 0xF8FF",
            );
        }
        for format in &self.formats {
            if !matches!(format.as_str(), "woff2" | "woff" | "ttf" | "eot" | "svg") {
                diag.error(FieldPath::new("icon.formats"), format!("unknown font format `{format}`"));
            }
        }
    }
}
