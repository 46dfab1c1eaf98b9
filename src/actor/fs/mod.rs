//! FileSystem Actor
//!
//! Watches the pattern bases of every task and sends one `TaskMsg::Run` per
//! task once its sources settle. Files a run read outside its patterns
//! arrive as `FsMsg::Inputs` and are watched too.
//!
//! ```text
//! Watcher → Debouncer (per-task timing, bound via WatchBindings) → TaskMsg
//! ```

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{FsMsg, TaskMsg};

// Pattern → task classification and watch roots.
mod bindings;
// Per-task timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


pub use bindings::WatchBindings;
use debouncer::Debouncer;
use watch_roots::WatchRoots;

/// Upper bound between watch-root checks.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    bindings: WatchBindings,
    /// Project root, for log lines
    root: PathBuf,
    task_tx: mpsc::Sender<TaskMsg>,
    rx: mpsc::Receiver<FsMsg>,
    debouncer: Debouncer,
}

impl FsActor {
    /// Start watching immediately; events buffer until `run`.
    pub fn new(
        bindings: WatchBindings,
        root: PathBuf,
        debounce: Duration,
        task_tx: mpsc::Sender<TaskMsg>,
        rx: mpsc::Receiver<FsMsg>,
    ) -> notify::Result<Self> {
        // notify is sync-only
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Missing roots are attached once they appear
        let mut watch_roots = WatchRoots::new(bindings.roots());
        watch_roots.attach_existing(&mut watcher)?;
        crate::debug!("watch"; "{} patterns, {} roots attached", bindings.len(), watch_roots.attached_count());

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            bindings,
            root,
            task_tx,
            rx,
            debouncer: Debouncer::new(debounce),
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let task_tx = self.task_tx;
        let mut rx = self.rx;
        let mut bindings = self.bindings;
        let root = self.root;
        let mut debouncer = self.debouncer;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event, &bindings),
                Some(FsMsg::Inputs { kind, files }) = rx.recv() => {
                    bindings.set_inputs(kind, files);
                    watch_roots.set_desired(bindings.roots(), &mut watcher);
                    watch_roots.maintain(&mut watcher);
                }
                _ = tokio::time::sleep(debouncer.sleep_duration().min(MAINTAIN_INTERVAL)) => {
                    watch_roots.maintain(&mut watcher);
                    if dispatch_ready(&mut debouncer, &task_tx, &root).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Send every settled batch to the TaskActor.
///
/// Returns `Err(())` if the TaskActor shut down
async fn dispatch_ready(
    debouncer: &mut Debouncer,
    task_tx: &mpsc::Sender<TaskMsg>,
    root: &std::path::Path,
) -> Result<(), ()> {
    for (kind, events) in debouncer.take_ready() {
        crate::log!("watch"; "{}: {}", kind, events.describe(root));
        task_tx
            .send(TaskMsg::Run {
                kind,
                changed: events.paths(),
            })
            .await
            .map_err(|_| ())?;
    }
    Ok(())
}
