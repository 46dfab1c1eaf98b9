//! Project configuration management for `kiln.toml`.
//!
//! ```text
//! config/
//! ├── section/       # One file per [table]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # Config file discovery
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! | Section    | Purpose                                             |
//! |------------|-----------------------------------------------------|
//! | `[build]`  | Output root, source maps, task ordering             |
//! | `[style]`  | SCSS entries, compiler command, browser targets     |
//! | `[script]` | Script entries, bundle path, minify/mangle          |
//! | `[image]`  | Image globs, optimization                           |
//! | `[fonts]`  | Font files copied to the output                     |
//! | `[html]`   | Pages watched for full reloads                      |
//! | `[icon]`   | SVG glyphs → icon font + stylesheet                 |
//! | `[sprite]` | Raster images → sprite sheet + stylesheet           |
//! | `[serve]`  | Asset server and live reload                        |
//! | `[watch]`  | Debounce                                            |
//!
//! The loaded value is immutable: commands pass `&ProjectConfig` (or an
//! `Arc` of it) to every task.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BuildConfig, FontsConfig, HtmlConfig, IconConfig, ImageConfig, ScriptConfig, ServeConfig,
    SpriteConfig, StyleConfig, WatchConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{BuildArgs, Cli, Commands, ServeArgs},
    log,
    task::TaskKind,
    utils::path::normalize_path,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub build: BuildConfig,
    pub style: StyleConfig,
    pub script: ScriptConfig,
    pub image: ImageConfig,
    pub fonts: FontsConfig,
    pub html: HtmlConfig,
    pub icon: IconConfig,
    pub sprite: SpriteConfig,
    pub serve: ServeConfig,
    pub watch: WatchConfig,
}

impl ProjectConfig {
    /// Load configuration for the parsed command line.
    ///
    /// Searches upward from cwd for the config file; the project root is
    /// its parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = find_config_file(&cli.config)
            .ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.apply_command_options(&cli.command());
        self.normalize_paths(&root);
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored): {}", display_path, fields.join(", "));
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root (for display).
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Source globs bound to a task (relative to root).
    pub fn sources(&self, kind: TaskKind) -> &[String] {
        match kind {
            TaskKind::Style => &self.style.sources,
            TaskKind::Icon => &self.icon.sources,
            TaskKind::Sprite => &self.sprite.sources,
            TaskKind::Script => &self.script.sources,
            TaskKind::Fonts => &self.fonts.sources,
            TaskKind::Image => &self.image.sources,
            TaskKind::Html => &self.html.sources,
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, command: &Commands) {
        match command {
            Commands::Build { build_args } | Commands::Watch { build_args } => {
                self.apply_build_args(build_args);
            }
            Commands::Webserver { serve_args } => self.apply_serve_args(serve_args),
            Commands::Default {
                build_args,
                serve_args,
            } => {
                self.apply_build_args(build_args);
                self.apply_serve_args(serve_args);
            }
            Commands::Clean => {}
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        if args.unordered {
            self.build.ordered = false;
        }
        self.build.only = args.only.clone();
    }

    fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve every configured path to an absolute one.
    ///
    /// Output-side paths (`style.output`, `fonts.output`, ...) are relative to
    /// the build output; generated sources (`sprite.image`,
    /// `icon.stylesheet`, ...) are relative to the project root.
    fn normalize_paths(&mut self, root: &Path) {
        let root = normalize_path(root);
        let join = |base: &Path, path: &Path| normalize_path(&base.join(expand_tilde(path)));

        self.build.output = join(&root, &self.build.output);
        let out = self.build.output.clone();
        self.build.maps = join(&out, &self.build.maps);

        self.style.output = join(&out, &self.style.output);
        self.script.output = join(&out, &self.script.output);
        self.image.output = join(&out, &self.image.output);
        self.fonts.output = join(&out, &self.fonts.output);
        self.icon.font_dir = join(&out, &self.icon.font_dir);

        self.icon.stylesheet = join(&root, &self.icon.stylesheet);
        self.sprite.image = join(&root, &self.sprite.image);
        self.sprite.stylesheet = join(&root, &self.sprite.stylesheet);
        self.serve.root = join(&root, &self.serve.root);

        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration, reporting every error at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.build.validate(&mut diag);
        self.style.validate(&mut diag);
        self.script.validate(&mut diag);
        self.image.validate(&mut diag);
        self.fonts.validate(&mut diag);
        self.html.validate(&mut diag);
        self.icon.validate(&mut diag);
        self.sprite.validate(&mut diag);
        self.serve.validate(&mut diag);
        self.validate_outputs(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Two tasks must never write the same file.
    fn validate_outputs(&self, diag: &mut ConfigDiagnostics) {
        let outputs = [
            ("style.output", &self.style.output),
            ("script.output", &self.script.output),
            ("icon.stylesheet", &self.icon.stylesheet),
            ("sprite.image", &self.sprite.image),
            ("sprite.stylesheet", &self.sprite.stylesheet),
        ];
        for (i, (field, path)) in outputs.iter().enumerate() {
            if let Some((other, _)) = outputs[..i].iter().find(|(_, p)| p == path) {
                diag.error(
                    FieldPath::new(*field),
                    format!("writes the same file as `{other}`: {}", path.display()),
                );
            }
        }

        if self.style.output.starts_with(&self.build.maps)
            || self.script.output.starts_with(&self.build.maps)
        {
            diag.warn(
                FieldPath::new("build.maps"),
                "bundles are written inside the source map directory",
            );
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if s.starts_with('~') => PathBuf::from(shellexpand::tilde(s).into_owned()),
        _ => path.to_path_buf(),
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config content. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Parse config content and resolve its paths against `root`.
#[cfg(test)]
pub fn test_config_at(root: &Path, content: &str) -> ProjectConfig {
    let mut config = test_parse_config(content);
    config.config_path = root.join("kiln.toml");
    config.normalize_paths(root);
    config
}
