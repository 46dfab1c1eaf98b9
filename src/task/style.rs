//! Stylesheet bundle.
//!
//! ```text
//! css/*.scss ─► includes ─► sass (stdin) ─┐
//! css/*.css  ─► includes ─────────────────┴─► concat ─► lightningcss ─► main.css
//!                                                                      └► maps/main.css.map
//! ```
//!
//! `_`-prefixed partials are only reachable through imports. If any entry
//! fails the bundle is left as it was. The map points at the entry and
//! include files; compiled Sass lines map to the start of their entry.

use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};
use crate::pipeline::css::{CssOptions, process_css};
use crate::pipeline::discover::SourceFile;
use crate::pipeline::include::{self, Expanded, IncludeError};
use crate::pipeline::sourcemap::LineMap;
use crate::utils::exec::{Cmd, SASS_FILTER, resolve_args};
use crate::utils::path::relative_url;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub struct StyleTask;

impl Task for StyleTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Style
    }

    fn inputs(&self, ctx: &TaskContext<'_>) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in entries(ctx, self).unwrap_or_default() {
            let Ok(expanded) = include::expand(&entry.path) else {
                continue;
            };
            for file in expanded.files {
                if !files.contains(&file) {
                    files.push(file);
                }
            }
        }
        files
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let mut report = TaskReport::default();
        let entries = entries(ctx, self)?;
        if entries.is_empty() {
            return Ok(report);
        }

        let compiled: Vec<_> = entries
            .par_iter()
            .map(|entry| compile_entry(ctx, entry))
            .collect();

        let mut bundle = String::new();
        let mut lines = LineMap::default();
        for (entry, result) in entries.iter().zip(compiled) {
            match result {
                Ok(compiled) => {
                    append(ctx, &mut bundle, &mut lines, entry, &compiled);
                    for file in compiled.expanded.files {
                        if !report.inputs.contains(&file) {
                            report.inputs.push(file);
                        }
                    }
                }
                Err(e) => report.fail(e),
            }
        }
        if !report.is_success() {
            return Ok(report);
        }

        let style = &ctx.config.style;
        let output = &style.output;
        let file_name = file_name(output);
        let processed = process_css(
            &bundle,
            &CssOptions {
                filename: &file_name,
                browsers: &style.browsers,
                minify: style.minify,
                sourcemap: style.sourcemap,
            },
        )
        .and_then(|processed| {
            let map = processed.map.map(|map| lines.compose(&map)).transpose()?;
            Ok((processed.code, map))
        });
        let (mut code, map) = match processed {
            Ok(processed) => processed,
            Err(e) => {
                report.fail(TaskError::invalid(ctx.display(output), e));
                return Ok(report);
            }
        };

        if let Some(map) = map {
            let map_path = ctx.config.build.maps.join(format!("{file_name}.map"));
            let dir = output.parent().unwrap_or(Path::new("/"));
            code.push_str(&format!(
                "\n/*# sourceMappingURL={} */\n",
                relative_url(dir, &map_path)
            ));
            ctx.write(&mut report, &map_path, map.as_bytes())?;
        }
        ctx.write(&mut report, output, code.as_bytes())?;

        report.reload = ReloadScope::css(&report.written);
        Ok(report)
    }
}

/// Entry stylesheets; `_`-prefixed partials are skipped.
fn entries(ctx: &TaskContext<'_>, task: &StyleTask) -> Result<Vec<SourceFile>, TaskError> {
    Ok(ctx
        .discover(task)?
        .into_iter()
        .filter(|f| !f.file_name().starts_with('_'))
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main.css".to_string())
}

struct Compiled {
    expanded: Expanded,
    /// Compiler output, for Sass entries.
    css: Option<String>,
}

/// Expand includes and compile one entry to CSS.
fn compile_entry(ctx: &TaskContext<'_>, entry: &SourceFile) -> Result<Compiled, TaskError> {
    let expanded = include::expand(&entry.path).map_err(|e| include_error(ctx, e))?;

    let ext = entry
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let css = match ext.as_deref() {
        Some("scss" | "sass") => Some(compile_sass(ctx, entry, &expanded.text)?),
        _ => None,
    };
    Ok(Compiled { expanded, css })
}

/// Add one compiled entry to the bundle and its line map.
fn append(
    ctx: &TaskContext<'_>,
    bundle: &mut String,
    lines: &mut LineMap,
    entry: &SourceFile,
    compiled: &Compiled,
) {
    let name = |path: &Path| ctx.display(path).display().to_string();
    match &compiled.css {
        None => {
            bundle.push_str(&compiled.expanded.text);
            lines.push_expanded(&compiled.expanded, |i| name(&compiled.expanded.files[i]));
        }
        Some(css) => {
            let content = compiled.expanded.sources.first().map_or("", String::as_str);
            let source = lines.add_source(&name(&entry.path), content);
            bundle.push_str(css);
            let mut count = css.matches('\n').count();
            if !bundle.ends_with('\n') {
                bundle.push('\n');
                count += 1;
            }
            lines.push_from(source, 0, count);
        }
    }
}

fn compile_sass(
    ctx: &TaskContext<'_>,
    entry: &SourceFile,
    source: &str,
) -> Result<String, TaskError> {
    let mut vars = ctx.env();
    let dir = entry.path.parent().unwrap_or(ctx.root());
    vars.insert("KILN_STYLE_DIR".into(), dir.display().to_string());

    let args = resolve_args(&ctx.config.style.compiler, &vars);
    let tool = args.first().cloned().unwrap_or_default();

    let mut cmd = Cmd::from_slice(&args)
        .cwd(ctx.root())
        .envs(&vars)
        .stdin(source)
        .filter(&SASS_FILTER);
    if entry.path.extension().is_some_and(|e| e == "sass") {
        cmd = cmd.arg("--indented");
    }

    let output = cmd.run().map_err(|e| {
        let message = format!("{}: {e:#}", ctx.display(&entry.path).display());
        missing_generated(ctx, &message).unwrap_or_else(|| TaskError::tool(&tool, message))
    })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Stylesheets written by other tasks, with their producer.
fn generated_stylesheets(ctx: &TaskContext<'_>) -> [(PathBuf, TaskKind); 2] {
    [
        (ctx.config.sprite.stylesheet.clone(), TaskKind::Sprite),
        (ctx.config.icon.stylesheet.clone(), TaskKind::Icon),
    ]
}

/// Compiler output naming a generated stylesheet that does not exist yet.
fn missing_generated(ctx: &TaskContext<'_>, message: &str) -> Option<TaskError> {
    generated_stylesheets(ctx)
        .into_iter()
        .find(|(path, _)| {
            !path.exists()
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| message.contains(stem))
        })
        .map(|(path, producer)| TaskError::MissingGenerated {
            path: ctx.display(&path),
            producer,
        })
}

fn include_error(ctx: &TaskContext<'_>, err: IncludeError) -> TaskError {
    if let Some(missing) = err.missing_path()
        && let Some((path, producer)) = generated_stylesheets(ctx)
            .into_iter()
            .find(|(path, _)| path == missing)
    {
        return TaskError::MissingGenerated {
            path: ctx.display(&path),
            producer,
        };
    }
    match err {
        IncludeError::Circular(path) => {
            TaskError::invalid(ctx.display(&path), "circular include")
        }
        IncludeError::Read(path, source) => TaskError::Read {
            path: ctx.display(&path),
            source,
        },
        err @ IncludeError::NotFound { .. } => TaskError::tool("include", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};
    use std::fs;

    const PLAIN_CSS: &str = "[style]\nsources = [\"css/*.css\"]\n";

    #[test]
    fn test_css_entries_bundled_with_map() {
        let (_dir, config) = project(PLAIN_CSS);
        let root = config.get_root();
        write(root, "css/a.css", "a {\n  color: #ff0000;\n}\n");
        write(root, "css/b.css", "/*= parts/b.part */\n");
        write(root, "css/parts/b.part", "b { margin: 0px }\n");
        write(root, "css/_skip.css", "skipped { color: blue }\n");

        let report = StyleTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success());
        assert_eq!(report.written.len(), 2);
        assert_eq!(
            report.reload,
            ReloadScope::Css(vec![config.style.output.clone()])
        );

        let css = fs::read_to_string(&config.style.output).unwrap();
        assert!(css.starts_with("a{color:red}b{margin:0}"));
        assert!(!css.contains("skipped"));
        assert!(css.ends_with("/*# sourceMappingURL=../maps/main.css.map */\n"));

        let map: serde_json::Value =
            serde_json::from_slice(&fs::read(config.build.maps.join("main.css.map")).unwrap())
                .unwrap();
        assert_eq!(
            map["sources"],
            serde_json::json!(["css/a.css", "css/b.css", "css/parts/b.part"])
        );
        assert_eq!(map["sourcesContent"][2], "b { margin: 0px }\n");
        assert!(report.inputs.contains(&root.join("css/parts/b.part")));
    }

    #[test]
    fn test_inputs_include_nested_files() {
        let (_dir, config) = project(PLAIN_CSS);
        let root = config.get_root();
        write(root, "css/main.css", "/*= parts/grid.part */\n");
        write(root, "css/parts/grid.part", "/*= deep/cols.part */\n");
        write(root, "css/parts/deep/cols.part", ".col { float: left }\n");

        let inputs = StyleTask.inputs(&TaskContext::new(&config));
        assert_eq!(
            inputs,
            vec![
                root.join("css/main.css"),
                root.join("css/parts/grid.part"),
                root.join("css/parts/deep/cols.part"),
            ]
        );
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let (_dir, config) = project(PLAIN_CSS);
        write(config.get_root(), "css/a.css", ".x { display: flex }\n");

        let ctx = TaskContext::new(&config);
        let first = StyleTask.run(&ctx).unwrap();
        let bytes = fs::read(&config.style.output).unwrap();
        let second = StyleTask.run(&ctx).unwrap();

        assert_eq!(first.written.len(), 2);
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), 2);
        assert_eq!(second.reload, ReloadScope::None);
        assert_eq!(fs::read(&config.style.output).unwrap(), bytes);
    }

    #[test]
    fn test_failed_entry_keeps_previous_bundle() {
        let (_dir, config) = project(PLAIN_CSS);
        let root = config.get_root();
        write(root, "css/a.css", "a { color: red }\n");
        StyleTask.run(&TaskContext::new(&config)).unwrap();
        let before = fs::read(&config.style.output).unwrap();

        write(root, "css/b.css", "//= missing.css\n");
        let report = StyleTask.run(&TaskContext::new(&config)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], TaskError::Tool { .. }));
        assert_eq!(fs::read(&config.style.output).unwrap(), before);
    }

    #[test]
    fn test_missing_sprite_stylesheet_is_diagnosed() {
        let (_dir, config) = project(PLAIN_CSS);
        write(config.get_root(), "css/main.css", "/*= sprite.scss */\n");

        let report = StyleTask.run(&TaskContext::new(&config)).unwrap();
        match &report.failures[..] {
            [TaskError::MissingGenerated { path, producer }] => {
                assert_eq!(path, Path::new("css/sprite.scss"));
                assert_eq!(*producer, TaskKind::Sprite);
            }
            other => panic!("unexpected failures: {other:?}"),
        }
        assert!(!config.style.output.exists());
    }

    #[test]
    fn test_no_sources_is_noop() {
        let (_dir, config) = project(PLAIN_CSS);
        let report = StyleTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.written.is_empty());
        assert_eq!(report.reload, ReloadScope::None);
    }

    #[test]
    fn test_missing_compiler_reported() {
        let (_dir, config) = project(
            "[style]\ncompiler = [\"kiln-test-no-such-sass\", \"--stdin\"]\n",
        );
        write(config.get_root(), "css/main.scss", "a { b: c }\n");

        let report = StyleTask.run(&TaskContext::new(&config)).unwrap();
        match &report.failures[..] {
            [TaskError::Tool { tool, message }] => {
                assert_eq!(tool, "kiln-test-no-such-sass");
                assert!(message.contains("not found"));
            }
            other => panic!("unexpected failures: {other:?}"),
        }
    }

    #[test]
    fn test_missing_generated_from_compiler_message() {
        let (_dir, config) = project("");
        let ctx = TaskContext::new(&config);
        let err = missing_generated(&ctx, "Error: Can't find stylesheet to import.\n@import 'killer';");
        assert!(matches!(
            err,
            Some(TaskError::MissingGenerated { producer: TaskKind::Icon, .. })
        ));
        assert!(missing_generated(&ctx, "Error: expected \";\"").is_none());
    }
}
