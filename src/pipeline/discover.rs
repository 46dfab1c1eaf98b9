//! Source discovery.
//!
//! Patterns are resolved against the project root at call time, so files
//! added while watching are picked up by the next run.

use crate::utils::path::clean_path;
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};

/// Characters that make a path component a glob.
const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A matched file and the directory its relative output path is taken from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Non-glob prefix of the pattern that matched (like gulp's `base`).
    pub base: PathBuf,
}

impl SourceFile {
    /// Path below the glob base, used to mirror the source layout.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Absolute, cleaned form of a root-relative pattern.
pub fn absolute_pattern(root: &Path, pattern: &str) -> PathBuf {
    clean_path(&root.join(pattern))
}

/// Directory part of a pattern before its first glob component.
pub fn glob_base(pattern: &Path) -> PathBuf {
    let mut base = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(s) = component
            && s.to_string_lossy().contains(GLOB_CHARS)
        {
            break;
        }
        base.push(component);
    }
    // A pattern without glob characters names a single file.
    if base == pattern {
        base.pop();
    }
    base
}

/// Whether the pattern can match below its base directory.
pub fn is_recursive(pattern: &str) -> bool {
    pattern.contains("**")
}

/// Resolve patterns to the files they match, sorted and de-duplicated.
///
/// A pattern matching nothing (or pointing into a missing directory) yields
/// no files; only malformed patterns are errors.
pub fn discover(root: &Path, patterns: &[String]) -> Result<Vec<SourceFile>, glob::PatternError> {
    let mut files = Vec::new();
    for pattern in patterns {
        let full = absolute_pattern(root, pattern);
        let base = glob_base(&full);
        let paths = glob::glob_with(&full.to_string_lossy(), MATCH_OPTIONS)?;
        for path in paths.flatten() {
            if path.is_file() {
                files.push(SourceFile {
                    path,
                    base: base.clone(),
                });
            }
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Compiled pattern used to match watch events.
#[derive(Debug, Clone)]
pub struct CompiledGlob {
    pattern: Pattern,
    base: PathBuf,
    recursive: bool,
}

impl CompiledGlob {
    pub fn new(root: &Path, pattern: &str) -> Result<Self, glob::PatternError> {
        let full = absolute_pattern(root, pattern);
        Ok(Self {
            pattern: Pattern::new(&full.to_string_lossy())?,
            base: glob_base(&full),
            recursive: is_recursive(pattern),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.pattern.matches_path_with(path, MATCH_OPTIONS)
    }

    /// Directory to watch for this pattern.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_glob_base() {
        assert_eq!(glob_base(Path::new("/p/css/*.scss")), PathBuf::from("/p/css"));
        assert_eq!(glob_base(Path::new("/p/img/**/*.*")), PathBuf::from("/p/img"));
        assert_eq!(glob_base(Path::new("/p/lib/app.js")), PathBuf::from("/p/lib"));
        assert_eq!(glob_base(Path::new("/*.html")), PathBuf::from("/"));
    }

    #[test]
    fn test_discover_sorted_with_bases() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "img/b.png");
        touch(dir.path(), "img/icons/a.png");
        touch(dir.path(), "img/a.jpg");

        let files = discover(dir.path(), &["img/**/*.*".to_string()]).unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.relative().to_path_buf()).collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("b.png"),
                PathBuf::from("icons/a.png"),
            ]
        );
    }

    #[test]
    fn test_discover_parent_relative_pattern() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "index.html");
        touch(dir.path(), "builder/kiln.toml");

        let root = dir.path().join("builder");
        let files = discover(&root, &["../*.html".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "index.html");
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = discover(dir.path(), &["sprites/*.*".to_string()]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_dedups_overlapping_patterns() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lib/app.js");
        let files = discover(dir.path(), &["lib/*.js".into(), "lib/*.*".into()]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_compiled_glob_matching() {
        let root = Path::new("/site/builder");
        let glob = CompiledGlob::new(root, "css/*.scss").unwrap();
        assert!(glob.matches(Path::new("/site/builder/css/main.scss")));
        assert!(!glob.matches(Path::new("/site/builder/css/sub/main.scss")));
        assert!(!glob.recursive());
        assert_eq!(glob.base(), Path::new("/site/builder/css"));

        let html = CompiledGlob::new(root, "../*.html").unwrap();
        assert!(html.matches(Path::new("/site/index.html")));
        assert_eq!(html.base(), Path::new("/site"));

        let img = CompiledGlob::new(root, "img/**/*.*").unwrap();
        assert!(img.matches(Path::new("/site/builder/img/a/b/c.png")));
        assert!(img.recursive());
    }
}
