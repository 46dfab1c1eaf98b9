//! Path normalization helpers.
//!
//! - `normalize_path`: canonical absolute path (falls back when missing)
//! - `clean_path`: lexical `.`/`..` removal, for paths that may not exist yet
//! - `url_path`: output file to the URL the dev server serves it under
//! - `relative_url`: relative reference between two output files

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first. Deleted or not-yet-written files fall back
/// to a lexical cleanup against the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean_path(path)
        } else {
            std::env::current_dir()
                .map_or_else(|_| clean_path(path), |cwd| clean_path(&cwd.join(path)))
        }
    })
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// `..` at the start of a relative path is kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// URL path of `file` when `root` is served at `/`.
///
/// Returns `None` when the file lives outside the served root.
pub fn url_path(file: &Path, root: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(format!("/{}", parts.join("/")))
}

/// Relative URL from a file in `from_dir` to `to`.
///
/// Both paths must be absolute and clean; used for `sourceMappingURL`.
pub fn relative_url(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_missing_absolute_is_cleaned() {
        let normalized = normalize_path(Path::new("/no/such/dir/../file.css"));
        assert_eq!(normalized, PathBuf::from("/no/such/file.css"));
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(
            clean_path(Path::new("/site/builder/../project/www")),
            PathBuf::from("/site/project/www")
        );
        assert_eq!(clean_path(Path::new("./css/./main.scss")), PathBuf::from("css/main.scss"));
        assert_eq!(clean_path(Path::new("../*.html")), PathBuf::from("../*.html"));
        assert_eq!(clean_path(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_url_path() {
        let root = Path::new("/site");
        assert_eq!(
            url_path(Path::new("/site/project/www/css/main.css"), root).as_deref(),
            Some("/project/www/css/main.css")
        );
        assert_eq!(url_path(Path::new("/elsewhere/a.css"), root), None);
    }

    #[test]
    fn test_relative_url() {
        assert_eq!(
            relative_url(Path::new("/www/css"), Path::new("/www/maps/main.css.map")),
            "../maps/main.css.map"
        );
        assert_eq!(
            relative_url(Path::new("/www/js"), Path::new("/www/js/app.js.map")),
            "app.js.map"
        );
    }
}
