//! Include directives.
//!
//! A line consisting of `//= path` or `/*= path */` is replaced by the
//! contents of `path`, resolved relative to the including file. Included
//! files are expanded recursively; cycles are errors.

use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?://=\s*(?P<line>.+?)|/\*=\s*(?P<block>.+?)\s*\*/)\s*$"#).unwrap()
});

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("circular include of `{}`", .0.display())]
    Circular(PathBuf),

    #[error("`{}` includes missing file `{}`", from.display(), path.display())]
    NotFound { from: PathBuf, path: PathBuf },

    #[error("failed to read `{}`", .0.display())]
    Read(PathBuf, #[source] io::Error),
}

impl IncludeError {
    /// File that could not be found, if that is the failure.
    pub fn missing_path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Position of one expanded line in the file it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOrigin {
    /// Index into [`Expanded::files`].
    pub file: usize,
    /// Zero-based line number.
    pub line: u32,
}

/// Expanded source text and every file it was assembled from.
#[derive(Debug, Default)]
pub struct Expanded {
    pub text: String,
    /// Files read, the expanded file first. Each appears once.
    pub files: Vec<PathBuf>,
    /// Contents of `files`, index for index.
    pub sources: Vec<String>,
    /// Origin of each line of `text`.
    pub lines: Vec<LineOrigin>,
}

/// Read `path` and expand its include directives.
pub fn expand(path: &Path) -> Result<Expanded, IncludeError> {
    let mut expanded = Expanded::default();
    let mut stack = Vec::new();
    expand_file(path, &mut stack, &mut expanded)?;
    Ok(expanded)
}

fn expand_file(
    path: &Path,
    stack: &mut Vec<PathBuf>,
    out: &mut Expanded,
) -> Result<(), IncludeError> {
    if stack.iter().any(|p| p == path) {
        return Err(IncludeError::Circular(path.to_path_buf()));
    }

    let source = fs::read_to_string(path).map_err(|e| IncludeError::Read(path.to_path_buf(), e))?;
    let file = match out.files.iter().position(|p| p == path) {
        Some(index) => index,
        None => {
            out.files.push(path.to_path_buf());
            out.sources.push(source.clone());
            out.files.len() - 1
        }
    };
    stack.push(path.to_path_buf());

    let dir = path.parent().unwrap_or(Path::new("."));
    for (line, text) in source.lines().enumerate() {
        match directive_target(text) {
            Some(target) => {
                let included = crate::utils::path::clean_path(&dir.join(target));
                if !included.is_file() {
                    return Err(IncludeError::NotFound {
                        from: path.to_path_buf(),
                        path: included,
                    });
                }
                expand_file(&included, stack, out)?;
            }
            None => {
                out.text.push_str(text);
                out.text.push('\n');
                out.lines.push(LineOrigin {
                    file,
                    line: line as u32,
                });
            }
        }
    }

    stack.pop();
    Ok(())
}

/// Path named by an include directive line.
fn directive_target(line: &str) -> Option<&str> {
    let caps = DIRECTIVE.captures(line)?;
    let raw = caps.name("line").or_else(|| caps.name("block"))?.as_str();
    let target = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    (!target.is_empty()).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directive_target() {
        assert_eq!(directive_target("//= vendor/jquery.js"), Some("vendor/jquery.js"));
        assert_eq!(directive_target("  /*= 'reset.css' */"), Some("reset.css"));
        assert_eq!(directive_target("// plain comment"), None);
        assert_eq!(directive_target("a = b; //= not a directive"), None);
    }

    #[test]
    fn test_expand_nested_relative() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib/parts")).unwrap();
        fs::write(dir.path().join("lib/main.js"), "//= parts/a.js\nmain();\n").unwrap();
        fs::write(dir.path().join("lib/parts/a.js"), "//= b.js\na();").unwrap();
        fs::write(dir.path().join("lib/parts/b.js"), "b();\n").unwrap();

        let expanded = expand(&dir.path().join("lib/main.js")).unwrap();
        assert_eq!(expanded.text, "b();\na();\nmain();\n");
        assert_eq!(expanded.files.len(), 3);
        assert_eq!(expanded.lines.len(), 3);
    }

    #[test]
    fn test_line_origins_follow_included_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.css"), "a {}\n/*= part.css */\n/*= part.css */\nz {}\n").unwrap();
        fs::write(dir.path().join("part.css"), "p {}\nq {}\n").unwrap();

        let expanded = expand(&dir.path().join("main.css")).unwrap();
        assert_eq!(expanded.files.len(), 2);
        assert_eq!(expanded.sources[1], "p {}\nq {}\n");
        let origins: Vec<_> = expanded.lines.iter().map(|o| (o.file, o.line)).collect();
        assert_eq!(origins, [(0, 0), (1, 0), (1, 1), (1, 0), (1, 1), (0, 3)]);
    }

    #[test]
    fn test_expand_reports_cycle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "/*= b.css */\n").unwrap();
        fs::write(dir.path().join("b.css"), "/*= a.css */\n").unwrap();

        let err = expand(&dir.path().join("a.css")).unwrap_err();
        assert!(matches!(err, IncludeError::Circular(_)));
    }

    #[test]
    fn test_expand_reports_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.scss"), "//= sprite.scss\n").unwrap();

        let err = expand(&dir.path().join("main.scss")).unwrap_err();
        assert_eq!(err.missing_path(), Some(dir.path().join("sprite.scss").as_path()));
    }
}
