use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::bindings::WatchBindings;
use super::types::{ChangeKind, DebouncedEvents};
use crate::task::TaskKind;
use crate::utils::path::normalize_path;

/// Changes collected for one task since its last batch.
pub(super) struct Pending {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Instant,
}

/// Per-task debouncer: a task's batch is ready once its sources have been
/// quiet for `window`. Tasks settle independently.
pub(super) struct Debouncer {
    window: Duration,
    pub(super) pending: FxHashMap<TaskKind, Pending>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            pending: FxHashMap::default(),
        }
    }

    /// Add a notify event, applying dedup rules per path:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → dropped
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event, bindings: &WatchBindings) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);
            for task in bindings.tasks_for(&path) {
                self.record(task, path.clone(), kind);
            }
        }
    }

    fn record(&mut self, task: TaskKind, path: PathBuf, kind: ChangeKind) {
        let now = Instant::now();
        let pending = self.pending.entry(task).or_insert_with(|| Pending {
            changes: FxHashMap::default(),
            last_event: now,
        });
        pending.last_event = now;

        let Some(&existing) = pending.changes.get(&path) else {
            crate::debug!("watch"; "{} {}: {}", task, kind.label(), path.display());
            pending.changes.insert(path, kind);
            return;
        };

        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                pending.changes.insert(path, kind);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                pending.changes.insert(path, ChangeKind::Removed);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                crate::debug!("watch"; "discard created+removed: {}", path.display());
                pending.changes.remove(&path);
            }
            _ => {}
        }
    }

    /// Take the batches of every task whose window has elapsed.
    pub(super) fn take_ready(&mut self) -> Vec<(TaskKind, DebouncedEvents)> {
        let ready: Vec<TaskKind> = self
            .pending
            .iter()
            .filter(|(_, p)| p.last_event.elapsed() >= self.window)
            .map(|(&kind, _)| kind)
            .collect();

        let mut batches = Vec::new();
        for kind in ready {
            let Some(pending) = self.pending.remove(&kind) else {
                continue;
            };
            if pending.changes.is_empty() {
                continue;
            }
            let mut changes: Vec<_> = pending.changes.into_iter().collect();
            changes.sort_by(|a, b| a.0.cmp(&b.0));
            batches.push((kind, DebouncedEvents(changes)));
        }
        batches.sort_by_key(|(kind, _)| *kind);
        batches
    }

    /// Sleep until the earliest pending batch can be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        self.pending
            .values()
            .map(|p| self.window.saturating_sub(p.last_event.elapsed()))
            .min()
            .map_or(Duration::from_secs(86400), |d| d.max(Duration::from_millis(1)))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
