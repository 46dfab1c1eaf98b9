//! Module bundling for the script task.
//!
//! Entries and every file they reach through `import`, `export ... from`
//! or `require("./...")` become numbered module functions in one script.
//! ESM syntax is rewritten in place into `require` calls and export
//! getters. Rewrites never change the number of lines in a module, so the
//! bundle's [`LineMap`] stays exact.
//!
//! Bare specifiers (`vue`, `lodash/fp`) are not bundled; they go to the
//! host `require` when the bundle runs under one.

use super::include::{self, Expanded, IncludeError};
use super::sourcemap::LineMap;
use crate::utils::path::clean_path;
use oxc::allocator::Allocator;
use oxc::ast::ast::{
    CallExpression, Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier,
    ModuleExportName, Program, Statement, StringLiteral,
};
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffixes tried, in order, when a relative specifier has no file of its own.
const RESOLVE_SUFFIXES: &[&str] = &[".js", ".mjs", ".cjs", ".json", "/index.js"];

const PRELUDE: &str = r#"(function (modules, entries, host) {
  var cache = {};
  function load(id) {
    if (typeof id === "string") {
      if (host) return host(id);
      throw new Error("Cannot find module '" + id + "'");
    }
    if (cache[id]) return cache[id].exports;
    var module = (cache[id] = { exports: {} });
    modules[id].call(module.exports, module, module.exports, load);
    return module.exports;
  }
  load.define = function (exports, getters) {
    Object.defineProperty(exports, "__esModule", { value: true });
    for (var name in getters) {
      Object.defineProperty(exports, name, { enumerable: true, get: getters[name] });
    }
  };
  load.reexport = function (exports, from) {
    Object.keys(from).forEach(function (name) {
      if (name === "default" || Object.prototype.hasOwnProperty.call(exports, name)) return;
      Object.defineProperty(exports, name, {
        enumerable: true,
        get: function () { return from[name]; }
      });
    });
  };
  load.interop = function (m) {
    return m && m.__esModule ? m.default : m;
  };
  for (var i = 0; i < entries.length; i++) load(entries[i]);
})({
"#;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error(transparent)]
    Include(#[from] IncludeError),

    #[error("{}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("{}: cannot resolve `{specifier}`", path.display())]
    Unresolved { path: PathBuf, specifier: String },
}

/// One script holding every reachable module.
#[derive(Debug)]
pub struct Bundle {
    pub code: String,
    /// Origin of each line of `code`.
    pub lines: LineMap,
    /// Every file read, includes and dependencies too.
    pub files: Vec<PathBuf>,
}

struct Module {
    expanded: Expanded,
    code: String,
}

/// Bundle `entries`, which run in the given order.
///
/// `display` names files in the line map. All failing modules are
/// reported, not just the first.
pub fn bundle(
    entries: &[PathBuf],
    display: impl Fn(&Path) -> String,
) -> Result<Bundle, Vec<BundleError>> {
    let mut graph = ModuleGraph::default();
    for entry in entries {
        graph.id(entry);
    }

    let mut modules = Vec::new();
    let mut errors = Vec::new();
    while let Some((id, path)) = graph.queue.pop_front() {
        match load_module(&path, &mut graph) {
            Ok(module) => modules.push((id, module)),
            Err(e) => errors.extend(e),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    modules.sort_by_key(|(id, _)| *id);

    let mut code = String::from(PRELUDE);
    let mut lines = LineMap::default();
    let mut files: Vec<PathBuf> = Vec::new();
    lines.push_generated(PRELUDE.lines().count());

    for (id, module) in &modules {
        let _ = writeln!(code, "{id}: function (module, exports, require) {{");
        lines.push_generated(1);

        code.push_str(&module.code);
        lines.push_expanded(&module.expanded, |i| display(&module.expanded.files[i]));
        let extra = module.code.matches('\n').count();
        lines.push_generated(extra.saturating_sub(module.expanded.lines.len()));

        code.push_str("},\n");
        lines.push_generated(1);

        for file in &module.expanded.files {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
    }

    let entry_ids: Vec<String> = (0..entries.len()).map(|id| id.to_string()).collect();
    let _ = writeln!(
        code,
        "}}, [{}], typeof require === \"function\" ? require : null);",
        entry_ids.join(", ")
    );
    lines.push_generated(1);

    Ok(Bundle { code, lines, files })
}

#[derive(Default)]
struct ModuleGraph {
    ids: FxHashMap<PathBuf, usize>,
    queue: VecDeque<(usize, PathBuf)>,
}

impl ModuleGraph {
    /// Id of the module at `path`, queueing it when first seen.
    fn id(&mut self, path: &Path) -> usize {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }
        let id = self.ids.len();
        self.ids.insert(path.to_path_buf(), id);
        self.queue.push_back((id, path.to_path_buf()));
        id
    }
}

fn load_module(path: &Path, graph: &mut ModuleGraph) -> Result<Module, Vec<BundleError>> {
    let expanded = include::expand(path).map_err(|e| vec![BundleError::from(e)])?;

    if path.extension().is_some_and(|e| e == "json") {
        let code = format!("module.exports = {};\n", expanded.text);
        return Ok(Module { expanded, code });
    }

    let code = rewrite(path, &expanded.text, graph)?;
    Ok(Module { expanded, code })
}

/// Parse one module and rewrite its module syntax.
fn rewrite(path: &Path, source: &str, graph: &mut ModuleGraph) -> Result<String, Vec<BundleError>> {
    let source_type = match path.extension().and_then(|e| e.to_str()) {
        Some("mjs") => SourceType::mjs(),
        Some("cjs") => SourceType::cjs(),
        _ => SourceType::unambiguous(),
    };
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let messages: Vec<_> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(vec![BundleError::Syntax {
            path: path.to_path_buf(),
            message: messages.join("\n"),
        }]);
    }

    let mut rewriter = Rewriter {
        path,
        graph,
        edits: Vec::new(),
        getters: Vec::new(),
        errors: Vec::new(),
        temps: 0,
    };
    rewriter.program(&ret.program);
    if !rewriter.errors.is_empty() {
        return Err(rewriter.errors);
    }
    Ok(rewriter.finish(&ret.program, source))
}

/// Replacement of `source[start..end]`.
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

struct Rewriter<'g, 'p> {
    path: &'p Path,
    graph: &'g mut ModuleGraph,
    edits: Vec<Edit>,
    /// Export name and the expression it reads.
    getters: Vec<(String, String)>,
    errors: Vec<BundleError>,
    temps: usize,
}

impl Rewriter<'_, '_> {
    fn program(&mut self, program: &Program<'_>) {
        if let Some(hashbang) = &program.hashbang {
            self.replace(hashbang.span, String::new());
        }
        for statement in &program.body {
            self.statement(statement);
        }
        self.visit_program(program);
    }

    fn statement(&mut self, statement: &Statement<'_>) {
        match statement {
            Statement::ImportDeclaration(decl) => {
                let module = self.temp();
                let mut text = format!("var {module} = require({});", self.target(&decl.source));
                for specifier in decl.specifiers.iter().flatten() {
                    let (local, value) = match specifier {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => {
                            (&s.local.name, member(&module, &s.imported))
                        }
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            (&s.local.name, format!("require.interop({module})"))
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            (&s.local.name, module.clone())
                        }
                    };
                    let _ = write!(text, " var {local} = {value};");
                }
                self.replace(decl.span, text);
            }
            Statement::ExportAllDeclaration(decl) => {
                let target = self.target(&decl.source);
                match &decl.exported {
                    Some(name) => {
                        let module = self.temp();
                        self.export(name.name().as_str(), module.clone());
                        self.replace(decl.span, format!("var {module} = require({target});"));
                    }
                    None => self.replace(
                        decl.span,
                        format!("require.reexport(exports, require({target}));"),
                    ),
                }
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source {
                    let module = self.temp();
                    let text = format!("var {module} = require({});", self.target(source));
                    for s in &decl.specifiers {
                        self.export(s.exported.name().as_str(), member(&module, &s.local));
                    }
                    self.replace(decl.span, text);
                } else if let Some(declaration) = &decl.declaration {
                    for name in declared_names(declaration) {
                        self.export(&name, name.clone());
                    }
                    self.strip(decl.span.start, declaration.span().start, "");
                } else {
                    for s in &decl.specifiers {
                        self.export(s.exported.name().as_str(), s.local.name().to_string());
                    }
                    self.replace(decl.span, String::new());
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                let named = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => f.id.as_ref(),
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => c.id.as_ref(),
                    _ => None,
                };
                let inner = decl.declaration.span();
                match named {
                    Some(id) => {
                        self.export("default", id.name.to_string());
                        self.strip(decl.span.start, inner.start, "");
                    }
                    None => {
                        self.export("default", "__kiln_default".to_string());
                        self.strip(decl.span.start, inner.start, "var __kiln_default = (");
                        self.strip(inner.end, decl.span.end, ");");
                    }
                }
            }
            _ => {}
        }
    }

    /// Numeric id for a relative specifier, or the quoted specifier itself.
    fn target(&mut self, source: &StringLiteral<'_>) -> String {
        let specifier = source.value.as_str();
        if !is_relative(specifier) {
            return quote(specifier);
        }
        match resolve(self.path, specifier) {
            Some(resolved) => self.graph.id(&resolved).to_string(),
            None => {
                self.errors.push(BundleError::Unresolved {
                    path: self.path.to_path_buf(),
                    specifier: specifier.to_string(),
                });
                quote(specifier)
            }
        }
    }

    fn temp(&mut self) -> String {
        self.temps += 1;
        format!("__kiln_m{}", self.temps)
    }

    fn export(&mut self, name: &str, value: String) {
        self.getters.push((name.to_string(), value));
    }

    fn replace(&mut self, span: Span, text: String) {
        self.edits.push(Edit {
            start: span.start,
            end: span.end,
            text,
        });
    }

    fn strip(&mut self, start: u32, end: u32, text: &str) {
        self.edits.push(Edit {
            start,
            end,
            text: text.to_string(),
        });
    }

    /// Apply the edits to `source` and prepend the export table.
    fn finish(mut self, program: &Program<'_>, source: &str) -> String {
        if program.source_type.is_module() {
            let getters: Vec<String> = self
                .getters
                .iter()
                .map(|(name, value)| {
                    format!("{}: function () {{ return {value}; }}", quote(name))
                })
                .collect();
            // After any directive prologue so "use strict" keeps its effect.
            let at = program.directives.last().map_or(0, |d| d.span.end);
            self.edits.push(Edit {
                start: at,
                end: at,
                text: format!("require.define(exports, {{{}}});", getters.join(", ")),
            });
        }

        self.edits.sort_by_key(|e| (e.start, e.end));
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in &self.edits {
            let (start, end) = (edit.start as usize, edit.end as usize);
            out.push_str(&source[cursor..start]);
            out.push_str(&edit.text);
            let removed = source[start..end].matches('\n').count();
            let added = edit.text.matches('\n').count();
            for _ in added..removed {
                out.push('\n');
            }
            cursor = end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

impl<'a> Visit<'a> for Rewriter<'_, '_> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Some(literal) = it.common_js_require()
            && is_relative(literal.value.as_str())
        {
            let target = self.target(literal);
            self.replace(literal.span, target);
        }
        walk::walk_call_expression(self, it);
    }
}

/// Names bound by an exported declaration.
fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(decl) => decl
            .declarations
            .iter()
            .flat_map(|d| d.id.get_binding_identifiers())
            .map(|id| id.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(f) => {
            f.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(c) => c.id.iter().map(|id| id.name.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// `module.name`, with CommonJS interop for `default`.
fn member(module: &str, name: &ModuleExportName<'_>) -> String {
    match name.name().as_str() {
        "default" => format!("require.interop({module})"),
        name => format!("{module}[{}]", quote(name)),
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

/// File a relative specifier names: exact, then with each suffix.
fn resolve(from: &Path, specifier: &str) -> Option<PathBuf> {
    let dir = from.parent()?;
    let base = clean_path(&dir.join(specifier));
    if base.is_file() {
        return Some(base);
    }
    RESOLVE_SUFFIXES
        .iter()
        .map(|suffix| {
            let mut candidate = base.clone().into_os_string();
            candidate.push(suffix);
            PathBuf::from(candidate)
        })
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn names(dir: &TempDir) -> impl Fn(&Path) -> String + '_ {
        |p| p.strip_prefix(dir.path()).unwrap().display().to_string()
    }

    #[test]
    fn test_esm_imports_become_module_requires() {
        let dir = tree(&[
            ("lib/app.js", "import greet, { shout as loud } from './util';\nloud(greet('x'));\n"),
            (
                "lib/util.js",
                "export default function greet(n) { return n; }\nexport const shout = (s) => s;\n",
            ),
        ]);
        let out = bundle(&[dir.path().join("lib/app.js")], names(&dir)).unwrap();

        assert!(!out.code.contains("import "));
        assert!(!out.code.contains("export "));
        assert!(out.code.contains("var __kiln_m1 = require(1);"));
        assert!(out.code.contains("var greet = require.interop(__kiln_m1);"));
        assert!(out.code.contains("var loud = __kiln_m1[\"shout\"];"));
        assert!(out.code.contains("\"default\": function () { return greet; }"));
        assert!(out.code.contains("\"shout\": function () { return shout; }"));
        assert!(out.code.ends_with("}, [0], typeof require === \"function\" ? require : null);\n"));
        assert_eq!(out.files.len(), 2);
        assert_eq!(out.lines.len(), out.code.matches('\n').count());
    }

    #[test]
    fn test_require_resolves_extensions_and_index() {
        let dir = tree(&[
            ("lib/main.js", "var a = require('./a');\nvar b = require('./b');\nvar v = require('vue');\n"),
            ("lib/a.cjs", "module.exports = 1;\n"),
            ("lib/b/index.js", "module.exports = require('../data.json');\n"),
            ("lib/data.json", "{\n  \"n\": 2\n}\n"),
        ]);
        let out = bundle(&[dir.path().join("lib/main.js")], names(&dir)).unwrap();

        assert!(out.code.contains("var a = require(1);"));
        assert!(out.code.contains("var b = require(2);"));
        assert!(out.code.contains("var v = require('vue');"));
        assert!(out.code.contains("module.exports = require(3);"));
        assert!(out.code.contains("module.exports = {\n  \"n\": 2\n}\n;"));
        assert_eq!(out.files.len(), 4);
        assert_eq!(out.lines.len(), out.code.matches('\n').count());
    }

    #[test]
    fn test_shared_dependency_bundled_once() {
        let dir = tree(&[
            ("lib/a.js", "require('./shared');\n"),
            ("lib/b.js", "require('./shared.js');\n"),
            ("lib/shared.js", "module.exports = {};\n"),
        ]);
        let entries = [dir.path().join("lib/a.js"), dir.path().join("lib/b.js")];
        let out = bundle(&entries, names(&dir)).unwrap();

        assert_eq!(out.code.matches("module.exports = {};").count(), 1);
        assert_eq!(out.code.matches("require(2)").count(), 2);
        assert!(out.code.contains("}, [0, 1], "));
    }

    #[test]
    fn test_export_forms() {
        let dir = tree(&[
            (
                "lib/m.mjs",
                "export * from './x.mjs';\nexport * as ns from './x.mjs';\nexport { y as z } from './x.mjs';\nconst k = 1;\nexport { k as key };\nexport default k + 1;\n",
            ),
            ("lib/x.mjs", "export const y = 2;\n"),
        ]);
        let out = bundle(&[dir.path().join("lib/m.mjs")], names(&dir)).unwrap();

        assert!(out.code.contains("require.reexport(exports, require(1));"));
        assert!(out.code.contains("\"ns\": function () { return __kiln_m1; }"));
        assert!(out.code.contains("\"z\": function () { return __kiln_m2[\"y\"]; }"));
        assert!(out.code.contains("\"key\": function () { return k; }"));
        assert!(out.code.contains("var __kiln_default = (k + 1);"));
        assert!(out.code.contains("\"default\": function () { return __kiln_default; }"));
    }

    #[test]
    fn test_rewrites_keep_line_count() {
        let source = "import {\n  a,\n  b\n} from './dep';\nexport {\n  a\n};\nb();\n";
        let dir = tree(&[("lib/main.js", source), ("lib/dep.js", "export const a = 1, b = 2;\n")]);
        let out = bundle(&[dir.path().join("lib/main.js")], names(&dir)).unwrap();

        let body_start = out.code.find("0: function").unwrap();
        let body: Vec<_> = out.code[body_start..].lines().skip(1).take(8).collect();
        assert_eq!(body[7], "b();");
        assert_eq!(out.lines.len(), out.code.matches('\n').count());
    }

    #[test]
    fn test_errors_name_each_failing_module() {
        let dir = tree(&[
            ("lib/a.js", "require('./missing');\n"),
            ("lib/b.js", "function (\n"),
        ]);
        let entries = [dir.path().join("lib/a.js"), dir.path().join("lib/b.js")];
        let errors = bundle(&entries, names(&dir)).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], BundleError::Unresolved { specifier, .. } if specifier == "./missing"));
        assert!(matches!(&errors[1], BundleError::Syntax { path, .. } if path.ends_with("lib/b.js")));
    }
}
