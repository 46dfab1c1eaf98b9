//! Output writing that leaves identical files untouched.
//!
//! Keeping mtimes stable on no-op rebuilds avoids needless reloads and
//! keeps downstream watchers quiet.

use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `bytes` to `path` unless the file already holds exactly those bytes.
/// Parent directories are created as needed.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> io::Result<WriteOutcome> {
    if let Ok(meta) = fs::metadata(path)
        && meta.is_file()
        && meta.len() == bytes.len() as u64
        && fs::read(path)? == bytes
    {
        return Ok(WriteOutcome::Unchanged);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_parents_then_skips_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("css/maps/main.css.map");

        assert_eq!(write_if_changed(&path, b"{}").unwrap(), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, b"{}").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, b"{ }").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read(&path).unwrap(), b"{ }");
    }

    #[test]
    fn test_same_length_different_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "abc").unwrap();
        assert_eq!(write_if_changed(&path, b"abd").unwrap(), WriteOutcome::Written);
    }
}
