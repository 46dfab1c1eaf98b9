use std::path::{Path, PathBuf};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Debounced changes of one task's sources, sorted by path
#[derive(Debug)]
pub(super) struct DebouncedEvents(pub(super) Vec<(PathBuf, ChangeKind)>);

impl DebouncedEvents {
    pub(super) fn paths(&self) -> Vec<PathBuf> {
        self.0.iter().map(|(path, _)| path.clone()).collect()
    }

    /// `css/main.scss modified` or `3 files changed`
    pub(super) fn describe(&self, root: &Path) -> String {
        match self.0.as_slice() {
            [(path, kind)] => {
                let rel = path.strip_prefix(root).unwrap_or(path);
                format!("{} {}", rel.display(), kind.label())
            }
            many => format!("{} files changed", many.len()),
        }
    }
}
