//! Icon font.
//!
//! Glyphs get private-use codepoints in name order, starting at
//! `icon.start_codepoint`, so a glyph set always maps to the same
//! characters. The stylesheet is written by kiln; the font binaries come
//! from the configured generator, which receives a config file describing
//! the glyphs, formats and codepoints. The generator reads one input
//! directory, so every glyph must live in the same one.

use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};
use crate::config::IconConfig;
use crate::pipeline::discover::SourceFile;
use crate::pipeline::write::{WriteOutcome, write_if_changed};
use crate::utils::exec::{Cmd, EMPTY_FILTER, resolve_args};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Generator config, relative to the project root.
const GENERATOR_CONFIG: &str = ".kiln/icon-font.json";

pub struct IconTask;

/// A glyph and its assigned codepoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub name: String,
    pub codepoint: u32,
}

/// Assign codepoints in name order.
pub fn assign_codepoints(names: &[String], start: u32) -> Vec<Glyph> {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted
        .into_iter()
        .zip(start..)
        .map(|(name, codepoint)| Glyph {
            name: name.clone(),
            codepoint,
        })
        .collect()
}

/// Configuration handed to the font generator (fantasticon's schema).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratorConfig<'a> {
    input_dir: &'a Path,
    output_dir: &'a Path,
    name: &'a str,
    font_types: &'a [String],
    asset_types: [&'a str; 0],
    normalize: bool,
    codepoints: BTreeMap<&'a str, u32>,
}

impl Task for IconTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Icon
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let mut report = TaskReport::default();
        let icon = &ctx.config.icon;

        let files: Vec<SourceFile> = ctx
            .discover(self)?
            .into_iter()
            .filter(|f| f.path.extension().is_some_and(|e| e.eq_ignore_ascii_case("svg")))
            .collect();
        if files.is_empty() {
            return Ok(report);
        }

        let names: Vec<String> = files.iter().filter_map(|f| glyph_name(&f.path)).collect();
        let glyphs = assign_codepoints(&names, icon.start_codepoint);

        ctx.write(&mut report, &icon.stylesheet, stylesheet(icon, &glyphs).as_bytes())?;

        if !icon.generator.is_empty() {
            match input_dir(ctx, &files) {
                Ok(input_dir) => match generate_font(ctx, input_dir, &glyphs) {
                    Ok(fonts) => {
                        for (path, outcome) in fonts {
                            report.record(path, outcome);
                        }
                    }
                    Err(e) => report.fail(e),
                },
                Err(errors) => errors.into_iter().for_each(|e| report.fail(e)),
            }
        }

        report.reload = ReloadScope::full_if(!report.written.is_empty());
        Ok(report)
    }
}

fn glyph_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Directory shared by every glyph. Glyphs elsewhere are reported.
fn input_dir<'f>(
    ctx: &TaskContext<'_>,
    files: &'f [SourceFile],
) -> Result<&'f Path, Vec<TaskError>> {
    let dir_of = |f: &'f SourceFile| f.path.parent().unwrap_or(Path::new(""));
    let dir = dir_of(&files[0]);
    let strays: Vec<TaskError> = files
        .iter()
        .filter(|f| dir_of(*f) != dir)
        .map(|f| {
            TaskError::invalid(
                ctx.display(&f.path),
                format!("glyph outside `{}`", ctx.display(dir).display()),
            )
        })
        .collect();
    if strays.is_empty() { Ok(dir) } else { Err(strays) }
}

/// Run the generator and report each font file it left behind, comparing
/// against the bytes present before the run.
fn generate_font(
    ctx: &TaskContext<'_>,
    input_dir: &Path,
    glyphs: &[Glyph],
) -> Result<Vec<(PathBuf, WriteOutcome)>, TaskError> {
    let icon = &ctx.config.icon;
    let fonts: Vec<PathBuf> = icon
        .formats
        .iter()
        .map(|format| icon.font_dir.join(format!("{}.{format}", icon.font_name)))
        .collect();
    let before: Vec<Option<Vec<u8>>> = fonts.iter().map(|p| std::fs::read(p).ok()).collect();

    let codepoints: BTreeMap<&str, u32> = glyphs
        .iter()
        .map(|g| (g.name.as_str(), g.codepoint))
        .collect();

    let config_path = ctx.root().join(GENERATOR_CONFIG);
    let generator_config = GeneratorConfig {
        input_dir,
        output_dir: &icon.font_dir,
        name: &icon.font_name,
        font_types: &icon.formats,
        asset_types: [],
        normalize: true,
        codepoints: codepoints.clone(),
    };
    let json = serde_json::to_string_pretty(&generator_config)
        .map_err(|e| TaskError::tool("icon", e))?;
    write_if_changed(&config_path, json.as_bytes()).map_err(|source| TaskError::Write {
        path: ctx.display(&config_path),
        source,
    })?;
    std::fs::create_dir_all(&icon.font_dir).map_err(|source| TaskError::Write {
        path: ctx.display(&icon.font_dir),
        source,
    })?;

    let mut vars = ctx.env();
    vars.insert("KILN_ICON_CONFIG".into(), config_path.display().to_string());
    vars.insert("KILN_ICON_DIR".into(), input_dir.display().to_string());
    vars.insert("KILN_FONT_DIR".into(), icon.font_dir.display().to_string());
    vars.insert("KILN_FONT_NAME".into(), icon.font_name.clone());
    vars.insert(
        "KILN_ICON_CODEPOINTS".into(),
        serde_json::to_string(&codepoints).unwrap_or_default(),
    );

    let args = resolve_args(&icon.generator, &vars);
    let tool = args.first().cloned().unwrap_or_default();
    Cmd::from_slice(&args)
        .cwd(ctx.root())
        .envs(&vars)
        .filter(&EMPTY_FILTER)
        .run()
        .map_err(|e| TaskError::tool(&tool, format!("{e:#}")))?;

    Ok(fonts
        .into_iter()
        .zip(before)
        .filter_map(|(path, before)| {
            let after = std::fs::read(&path).ok()?;
            let outcome = if before.as_deref() == Some(after.as_slice()) {
                WriteOutcome::Unchanged
            } else {
                WriteOutcome::Written
            };
            Some((path, outcome))
        })
        .collect())
}

/// `@font-face` plus one `:before` rule per glyph.
pub fn stylesheet(icon: &IconConfig, glyphs: &[Glyph]) -> String {
    let name = &icon.font_name;
    let prefix = &icon.class_prefix;
    let mut out = String::new();

    let sources: Vec<String> = icon
        .formats
        .iter()
        .map(|format| {
            format!(
                "url('{}{name}.{format}') format('{}')",
                icon.font_url,
                font_format(format)
            )
        })
        .collect();

    let _ = writeln!(out, "@font-face {{");
    let _ = writeln!(out, "  font-family: \"{name}\";");
    let _ = writeln!(out, "  src: {};", sources.join(",\n    "));
    let _ = writeln!(out, "  font-weight: normal;");
    let _ = writeln!(out, "  font-style: normal;");
    let _ = writeln!(out, "}}\n");

    let _ = writeln!(out, "[class^=\"{prefix}\"]:before,");
    let _ = writeln!(out, "[class*=\" {prefix}\"]:before {{");
    let _ = writeln!(out, "  font-family: \"{name}\";");
    let _ = writeln!(out, "  font-style: normal;");
    let _ = writeln!(out, "  font-weight: normal;");
    let _ = writeln!(out, "  font-variant: normal;");
    let _ = writeln!(out, "  text-transform: none;");
    let _ = writeln!(out, "  line-height: 1;");
    let _ = writeln!(out, "  -webkit-font-smoothing: antialiased;");
    let _ = writeln!(out, "  -moz-osx-font-smoothing: grayscale;");
    let _ = writeln!(out, "}}");

    for glyph in glyphs {
        let _ = writeln!(
            out,
            "\n.{prefix}{}:before {{\n  content: \"\\{:X}\";\n}}",
            glyph.name, glyph.codepoint
        );
    }
    out
}

/// CSS `format()` hint for a font file extension.
fn font_format(ext: &str) -> &str {
    match ext {
        "ttf" => "truetype",
        "otf" => "opentype",
        "eot" => "embedded-opentype",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};
    use std::fs;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M0 0h16v16H0z"/></svg>"#;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_codepoints_follow_name_order() {
        let glyphs = assign_codepoints(&names(&["search", "arrow", "close"]), 0xE001);
        assert_eq!(
            glyphs,
            vec![
                Glyph { name: "arrow".into(), codepoint: 0xE001 },
                Glyph { name: "close".into(), codepoint: 0xE002 },
                Glyph { name: "search".into(), codepoint: 0xE003 },
            ]
        );
        // Discovery order does not matter.
        assert_eq!(
            assign_codepoints(&names(&["close", "search", "arrow"]), 0xE001),
            glyphs
        );
    }

    #[test]
    fn test_stylesheet_rules() {
        let icon = IconConfig::default();
        let css = stylesheet(&icon, &assign_codepoints(&names(&["arrow"]), 0xE001));
        assert!(css.contains("font-family: \"killer\";"));
        assert!(css.contains(
            "src: url('../fonts/killer.woff2') format('woff2'),\n    url('../fonts/killer.woff') format('woff');"
        ));
        assert!(css.contains(".icon-arrow:before {\n  content: \"\\E001\";\n}"));
    }

    #[test]
    fn test_stylesheet_without_generator() {
        let (_dir, config) = project("[icon]\ngenerator = []\n");
        let root = config.get_root();
        write(root, "icons/b.svg", SVG);
        write(root, "icons/a.svg", SVG);

        let report = IconTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success());
        assert_eq!(report.written, vec![config.icon.stylesheet.clone()]);

        let css = fs::read_to_string(&config.icon.stylesheet).unwrap();
        assert!(css.contains(".icon-a:before {\n  content: \"\\E001\";"));
        assert!(css.contains(".icon-b:before {\n  content: \"\\E002\";"));
        assert!(!root.join(GENERATOR_CONFIG).exists());
    }

    #[test]
    fn test_missing_generator_is_tool_failure() {
        let (_dir, config) =
            project("[icon]\ngenerator = [\"kiln-test-no-such-generator\", \"$KILN_ICON_CONFIG\"]\n");
        let root = config.get_root();
        write(root, "icons/star.svg", SVG);

        let report = IconTask.run(&TaskContext::new(&config)).unwrap();
        assert!(matches!(&report.failures[..], [TaskError::Tool { .. }]));
        // The stylesheet does not depend on the generator.
        assert!(config.icon.stylesheet.is_file());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(root.join(GENERATOR_CONFIG)).unwrap())
                .unwrap();
        assert_eq!(json["name"], "killer");
        assert_eq!(json["codepoints"]["star"], 0xE001);
        assert_eq!(json["fontTypes"], serde_json::json!(["woff2", "woff"]));
    }

    /// Generator stand-in writing fixed bytes to the first font format.
    const FAKE_GENERATOR: &str = "[icon]\nformats = [\"woff2\"]\ngenerator = [\"sh\", \"-c\", \"printf glyphs > $KILN_FONT_DIR/$KILN_FONT_NAME.woff2\"]\n";

    #[test]
    fn test_regenerated_identical_font_is_unchanged() {
        let (_dir, config) = project(FAKE_GENERATOR);
        write(config.get_root(), "icons/star.svg", SVG);
        let font = config.icon.font_dir.join("killer.woff2");

        let ctx = TaskContext::new(&config);
        let first = IconTask.run(&ctx).unwrap();
        assert!(first.is_success(), "{:?}", first.failures);
        assert!(first.written.contains(&font));
        assert_eq!(first.reload, ReloadScope::Full);

        let second = IconTask.run(&ctx).unwrap();
        assert!(second.is_success(), "{:?}", second.failures);
        assert!(second.written.is_empty());
        assert!(second.unchanged.contains(&font));
        assert_eq!(second.reload, ReloadScope::None);
    }

    #[test]
    fn test_glyphs_in_several_directories_rejected() {
        let (_dir, config) = project(&format!(
            "{FAKE_GENERATOR}sources = [\"icons/**/*.svg\"]\n"
        ));
        let root = config.get_root();
        write(root, "icons/a.svg", SVG);
        write(root, "icons/extra/b.svg", SVG);

        let report = IconTask.run(&TaskContext::new(&config)).unwrap();
        match &report.failures[..] {
            [TaskError::Source { path, message }] => {
                assert_eq!(path, Path::new("icons/extra/b.svg"));
                assert!(message.contains("icons"));
            }
            other => panic!("unexpected failures: {other:?}"),
        }
        assert!(!config.icon.font_dir.join("killer.woff2").exists());
    }

    #[test]
    fn test_no_glyphs_is_noop() {
        let (_dir, config) = project("");
        let report = IconTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.written.is_empty());
        assert!(!config.icon.stylesheet.exists());
    }
}
