use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::config::ProjectConfig;
use crate::pipeline::discover::CompiledGlob;
use crate::task::{TaskContext, TaskKind, task};
use crate::utils::path::normalize_path;

/// A watched pattern and the task it re-runs.
#[derive(Debug)]
struct WatchBinding {
    glob: CompiledGlob,
    kind: TaskKind,
}

/// Directory the watcher attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct WatchRoot {
    pub(super) path: PathBuf,
    pub(super) recursive: bool,
}

/// Every binding of the watched tasks.
///
/// Patterns are compiled once at watch start. Input files (includes and
/// imports a task read) are seeded then and replaced after each run.
#[derive(Debug)]
pub struct WatchBindings {
    bindings: Vec<WatchBinding>,
    inputs: FxHashMap<TaskKind, Vec<PathBuf>>,
}

impl WatchBindings {
    pub fn new(config: &ProjectConfig, kinds: &[TaskKind]) -> Result<Self, glob::PatternError> {
        let mut bindings = Vec::new();
        for &kind in kinds {
            for pattern in task(kind).watch_globs(config) {
                bindings.push(WatchBinding {
                    glob: CompiledGlob::new(config.get_root(), &pattern)?,
                    kind,
                });
            }
        }

        let mut this = Self {
            bindings,
            inputs: FxHashMap::default(),
        };
        let ctx = TaskContext::new(config);
        for &kind in kinds {
            this.set_inputs(kind, task(kind).inputs(&ctx));
        }
        Ok(this)
    }

    /// Replace the input files bound to `kind`.
    pub fn set_inputs(&mut self, kind: TaskKind, files: Vec<PathBuf>) {
        let files: Vec<PathBuf> = files.iter().map(|f| normalize_path(f)).collect();
        if files.is_empty() {
            self.inputs.remove(&kind);
        } else {
            self.inputs.insert(kind, files);
        }
    }

    /// Tasks whose patterns or inputs match `path`, in aggregate order.
    pub fn tasks_for(&self, path: &Path) -> Vec<TaskKind> {
        let mut kinds: Vec<TaskKind> = self
            .bindings
            .iter()
            .filter(|b| b.glob.matches(path))
            .map(|b| b.kind)
            .chain(
                self.inputs
                    .iter()
                    .filter(|(_, files)| files.iter().any(|f| f == path))
                    .map(|(kind, _)| *kind),
            )
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// One root per pattern base; a base shared by a recursive and a flat
    /// pattern is watched recursively. Input files add their directory
    /// unless a root already covers it.
    pub(super) fn roots(&self) -> Vec<WatchRoot> {
        let mut roots: Vec<WatchRoot> = Vec::new();
        for binding in &self.bindings {
            let path = binding.glob.base();
            match roots.iter_mut().find(|r| r.path == path) {
                Some(root) => root.recursive |= binding.glob.recursive(),
                None => roots.push(WatchRoot {
                    path: path.to_path_buf(),
                    recursive: binding.glob.recursive(),
                }),
            }
        }

        let mut dirs: Vec<&Path> = self
            .inputs
            .values()
            .flatten()
            .filter_map(|f| f.parent())
            .collect();
        dirs.sort();
        dirs.dedup();
        for dir in dirs {
            let covered = roots
                .iter()
                .any(|r| r.path == dir || (r.recursive && dir.starts_with(&r.path)));
            if !covered {
                roots.push(WatchRoot {
                    path: dir.to_path_buf(),
                    recursive: false,
                });
            }
        }
        roots
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
