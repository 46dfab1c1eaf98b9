use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::path::PathBuf;

use super::bindings::WatchRoot;

/// Watch-root consistency manager.
///
/// - Attach existing roots at startup
/// - Re-attach roots that were removed and recreated
/// - Follow the desired set as task inputs change
pub(super) struct WatchRoots {
    desired: Vec<WatchRoot>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(roots: Vec<WatchRoot>) -> Self {
        Self {
            desired: roots,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for root in &self.desired {
            if !root.path.is_dir() {
                crate::debug!("watch"; "not yet present: {}", root.path.display());
                continue;
            }
            watcher.watch(&root.path, mode(root))?;
            self.attached.insert(root.path.clone());
        }

        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for root in &self.desired {
            if self.attached.contains(&root.path) || !root.path.is_dir() {
                continue;
            }

            if watcher.watch(&root.path, mode(root)).is_ok() {
                self.attached.insert(root.path.clone());
                crate::debug!("watch"; "re-attached watch: {}", root.path.display());
            }
        }
    }

    /// Replace the desired roots. Roots no longer desired are detached; new
    /// ones attach on the next `maintain`.
    pub(super) fn set_desired(&mut self, roots: Vec<WatchRoot>, watcher: &mut RecommendedWatcher) {
        let stale: Vec<PathBuf> = self
            .attached
            .iter()
            .filter(|path| {
                !roots
                    .iter()
                    .any(|r| &r.path == *path && self.desired.contains(r))
            })
            .cloned()
            .collect();
        for path in stale {
            let _ = watcher.unwatch(&path);
            self.attached.remove(&path);
        }
        self.desired = roots;
    }

    pub(super) fn attached_count(&self) -> usize {
        self.attached.len()
    }
}

fn mode(root: &WatchRoot) -> RecursiveMode {
    if root.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    }
}
