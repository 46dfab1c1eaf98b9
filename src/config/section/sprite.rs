//! `[sprite]` section configuration.
//!
//! ```toml
//! [sprite]
//! sources = ["sprites/*.*"]
//! image = "img/sprite.png"            # Packed sheet (relative to project root)
//! stylesheet = "css/sprite.scss"      # Generated SCSS (relative to project root)
//! image_url = "../img/sprite.png"     # URL used in background-image
//! prefix = "s-"
//! padding = 0
//! ```

use super::{strings, validate_globs};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub sources: Vec<String>,
    pub image: PathBuf,
    pub stylesheet: PathBuf,
    pub image_url: String,
    pub prefix: String,
    /// Transparent gap between packed images, in pixels.
    pub padding: u32,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            sources: strings(&["sprites/*.*"]),
            image: "img/sprite.png".into(),
            stylesheet: "css/sprite.scss".into(),
            image_url: "../img/sprite.png".into(),
            prefix: "s-".into(),
            padding: 0,
        }
    }
}

impl SpriteConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_globs(FieldPath::new("sprite.sources"), &self.sources, diag);
        if self.image.extension().is_none_or(|ext| !ext.eq_ignore_ascii_case("png")) {
            diag.error(FieldPath::new("sprite.image"), "sprite sheet must be a .png file");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_sprite_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.sprite.prefix, "s-");
        assert_eq!(config.sprite.padding, 0);
        assert_eq!(config.sprite.image_url, "../img/sprite.png");
    }

    #[test]
    fn test_sprite_requires_png() {
        let config = test_parse_config("[sprite]\nimage = \"img/sprite.jpg\"");
        let mut diag = ConfigDiagnostics::new();
        config.sprite.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
