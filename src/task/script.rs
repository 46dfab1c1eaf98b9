//! Script bundle: sorted entries and everything they import or require,
//! wrapped as modules, then one oxc pass producing `app.js` and
//! `maps/app.js.map`.

use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};
use crate::pipeline::bundle::{BundleError, bundle};
use crate::pipeline::js::{JsOptions, process_js};
use crate::utils::path::relative_url;
use std::path::{Path, PathBuf};

/// Extensions bundled; anything else matched by the glob is ignored.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "cjs", "mjs"];

pub struct ScriptTask;

impl Task for ScriptTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Script
    }

    fn inputs(&self, ctx: &TaskContext<'_>) -> Vec<PathBuf> {
        let entries = entries(ctx, self).unwrap_or_default();
        if entries.is_empty() {
            return Vec::new();
        }
        bundle(&entries, |p| ctx.display(p).display().to_string())
            .map(|bundled| bundled.files)
            .unwrap_or_default()
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let mut report = TaskReport::default();
        let entries = entries(ctx, self)?;
        if entries.is_empty() {
            return Ok(report);
        }

        let bundled = match bundle(&entries, |p| ctx.display(p).display().to_string()) {
            Ok(bundled) => bundled,
            Err(errors) => {
                for e in errors {
                    report.fail(bundle_error(ctx, e));
                }
                return Ok(report);
            }
        };
        report.inputs = bundled.files;

        let script = &ctx.config.script;
        let output = &script.output;
        let file_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app.js".to_string());

        let processed = process_js(
            &bundled.code,
            &JsOptions {
                filename: &file_name,
                minify: script.minify,
                mangle: script.mangle,
                sourcemap: script.sourcemap,
            },
        )
        .and_then(|processed| {
            let map = processed
                .map
                .map(|map| bundled.lines.compose(&map))
                .transpose()?;
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
            if !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&format!(
                "//# sourceMappingURL={}\n",
                relative_url(dir, &map_path)
            ));
            ctx.write(&mut report, &map_path, map.as_bytes())?;
        }
        ctx.write(&mut report, output, code.as_bytes())?;

        report.reload = ReloadScope::full_if(!report.written.is_empty());
        Ok(report)
    }
}

/// Matched files with a script extension, in sorted order.
fn entries(ctx: &TaskContext<'_>, task: &ScriptTask) -> Result<Vec<PathBuf>, TaskError> {
    Ok(ctx
        .discover(task)?
        .into_iter()
        .filter(|f| {
            f.path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .map(|f| f.path)
        .collect())
}

fn bundle_error(ctx: &TaskContext<'_>, err: BundleError) -> TaskError {
    match err {
        BundleError::Include(e) => TaskError::tool("include", e),
        BundleError::Syntax { path, message } => TaskError::invalid(ctx.display(&path), message),
        BundleError::Unresolved { path, specifier } => TaskError::invalid(
            ctx.display(&path),
            format!("cannot resolve `{specifier}`"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};
    use std::fs;

    fn read_map(config: &crate::config::ProjectConfig) -> serde_json::Value {
        serde_json::from_slice(&fs::read(config.build.maps.join("app.js.map")).unwrap()).unwrap()
    }

    #[test]
    fn test_one_bundle_and_one_map() {
        let (_dir, config) = project("[script]\nminify = false\n");
        let root = config.get_root();
        write(root, "lib/a.js", "module.exports = function add(first, second) { return first + second; };\n");
        write(root, "lib/b.js", "//= vendor/helper.js\nconsole.log(require('./a')(helper, 2));\n");
        write(root, "lib/vendor/helper.js", "var helper = 1;\n");
        write(root, "lib/notes.txt", "not a script");

        let report = ScriptTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.written.len(), 2);
        assert_eq!(report.reload, ReloadScope::Full);
        assert!(report.inputs.contains(&root.join("lib/vendor/helper.js")));

        let js = fs::read_to_string(&config.script.output).unwrap();
        assert!(js.contains("add"));
        assert!(js.contains("helper"));
        assert!(js.ends_with("//# sourceMappingURL=../maps/app.js.map\n"));

        let maps: Vec<_> = fs::read_dir(&config.build.maps).unwrap().collect();
        assert_eq!(maps.len(), 1);
        assert_eq!(read_map(&config)["version"], 3);
    }

    #[test]
    fn test_map_points_at_each_source_file() {
        let (_dir, config) = project("");
        let root = config.get_root();
        write(root, "lib/a.js", "window.first = function () {\n  return 'a';\n};\n");
        write(root, "lib/b.js", "\n\nwindow.second = function () {\n  return 'b';\n};\n");

        let report = ScriptTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success(), "{:?}", report.failures);

        let map = read_map(&config);
        let sources: Vec<_> = map["sources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect();
        assert_eq!(sources, ["lib/a.js", "lib/b.js"]);
        assert_eq!(map["sourcesContent"][1], "\n\nwindow.second = function () {\n  return 'b';\n};\n");
    }

    #[test]
    fn test_esm_entry_is_bundled_with_its_imports() {
        let (_dir, config) = project("[script]\nminify = false\n");
        let root = config.get_root();
        write(root, "lib/app.mjs", "import { greet } from './modules/greet.mjs';\ngreet('kiln');\n");
        write(root, "lib/modules/greet.mjs", "export function greet(name) {\n  console.log(name);\n}\n");

        let report = ScriptTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success(), "{:?}", report.failures);
        assert!(report.inputs.contains(&root.join("lib/modules/greet.mjs")));

        let js = fs::read_to_string(&config.script.output).unwrap();
        assert!(!js.contains("import {"));
        assert!(js.contains("console.log(name)"));
        assert!(js.contains("greet(\"kiln\")") || js.contains("greet('kiln')"));
    }

    #[test]
    fn test_require_entry_pulls_in_dependency() {
        let (_dir, config) = project("[script]\nminify = false\n");
        let root = config.get_root();
        write(root, "lib/main.js", "var helper = require('./vendor/helper');\nhelper.run();\n");
        write(root, "lib/vendor/helper.js", "exports.run = function () { return 'ran'; };\n");

        let report = ScriptTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success(), "{:?}", report.failures);

        let js = fs::read_to_string(&config.script.output).unwrap();
        assert!(js.contains("ran"));
        assert!(!js.contains("./vendor/helper"));
    }

    #[test]
    fn test_unresolved_import_names_importer() {
        let (_dir, config) = project("");
        write(config.get_root(), "lib/app.js", "import x from './nope';\nx();\n");

        let report = ScriptTask.run(&TaskContext::new(&config)).unwrap();
        assert_eq!(report.failures.len(), 1);
        let message = report.failures[0].to_string();
        assert!(message.starts_with("lib/app.js"), "{message}");
        assert!(message.contains("./nope"));
        assert!(!config.script.output.exists());
    }

    #[test]
    fn test_syntax_error_names_file_and_skips_write() {
        let (_dir, config) = project("");
        let root = config.get_root();
        write(root, "lib/good.js", "var ok = 1;\n");
        write(root, "lib/bad.js", "function (\n");

        let report = ScriptTask.run(&TaskContext::new(&config)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].to_string().starts_with("lib/bad.js"));
        assert!(!config.script.output.exists());
    }
}
