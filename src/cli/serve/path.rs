//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve a request URL under `serve_root`, using `index.html` for directories.
///
/// Returns `None` for anything outside the root, including symlink escapes.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Decode, strip the query string and fragment, trim slashes.
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.replace('\\', "/").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("www/css")).unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("www/css/main.css"), "a{}").unwrap();
        dir
    }

    #[test]
    fn test_resolve_file_and_index() {
        let dir = site();
        let root = dir.path();

        let css = resolve_path("/www/css/main.css?kiln=123", root).unwrap();
        assert!(css.ends_with("www/css/main.css"));

        let index = resolve_path("/", root).unwrap();
        assert!(index.ends_with("index.html"));
    }

    #[test]
    fn test_resolve_percent_encoded() {
        let dir = site();
        fs::write(dir.path().join("my page.html"), "").unwrap();
        assert!(resolve_path("/my%20page.html", dir.path()).is_some());
    }

    #[test]
    fn test_missing_and_dir_without_index() {
        let dir = site();
        assert!(resolve_path("/nope.css", dir.path()).is_none());
        assert!(resolve_path("/www/css/", dir.path()).is_none());
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = site();
        let root = dir.path().join("www");
        assert!(resolve_path("/../index.html", &root).is_none());
        assert!(resolve_path("/%2e%2e/index.html", &root).is_none());
        assert!(resolve_path("/css/..%5c..%5cindex.html", &root).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let dir = site();
        let root = dir.path().join("www");
        std::os::unix::fs::symlink(dir.path().join("index.html"), root.join("link.html"))
            .unwrap();
        assert!(resolve_path("/link.html", &root).is_none());
    }
}
