//! Configuration section definitions, one file per `kiln.toml` table.

mod build;
mod fonts;
mod icon;
mod image;
mod script;
mod serve;
mod sprite;
mod style;
mod watch;

pub use build::BuildConfig;
pub use fonts::{FontsConfig, HtmlConfig};
pub use icon::IconConfig;
pub use image::ImageConfig;
pub use script::ScriptConfig;
pub use serve::ServeConfig;
pub use sprite::SpriteConfig;
pub use style::StyleConfig;
pub use watch::WatchConfig;

use crate::config::{ConfigDiagnostics, FieldPath};

/// Check that a source list is non-empty and every entry is a valid glob.
pub(crate) fn validate_globs(field: FieldPath, sources: &[String], diag: &mut ConfigDiagnostics) {
    if sources.is_empty() {
        diag.error_with_hint(
            field,
            "no source globs configured",
            "add at least one pattern, e.g. \"css/*.scss\"",
        );
        return;
    }
    for pattern in sources {
        if let Err(e) = glob::Pattern::new(pattern) {
            diag.error(field, format!("invalid glob `{pattern}`: {e}"));
        }
    }
}

/// Check that an external command list has a program name.
pub(crate) fn validate_command(field: FieldPath, command: &[String], diag: &mut ConfigDiagnostics) {
    if command.first().is_some_and(|p| p.trim().is_empty()) {
        diag.error(field, "command program must not be empty");
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
