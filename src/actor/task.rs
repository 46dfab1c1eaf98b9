//! Task Actor
//!
//! Runs tasks on tokio's blocking pool as their sources change and turns the
//! results into live-reload messages.
//!
//! Each task has a run queue of depth one: a request while the task is in
//! flight is parked (a newer request replaces it), and starts when the
//! current run finishes. A task never runs concurrently with itself.

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;

use super::messages::{FsMsg, TaskMsg, WsMsg};
use crate::config::ProjectConfig;
use crate::logger::{status_error, status_success, status_unchanged};
use crate::task::runner::{TaskRun, run_task};
use crate::task::{ReloadScope, TaskKind};
use crate::utils::path::url_path;

/// In-flight and parked runs per task.
#[derive(Debug, Default)]
pub struct RunQueue {
    in_flight: FxHashSet<TaskKind>,
    parked: FxHashMap<TaskKind, Vec<PathBuf>>,
}

impl RunQueue {
    /// Request a run. Returns `true` when the caller should start it now.
    pub fn request(&mut self, kind: TaskKind, changed: Vec<PathBuf>) -> bool {
        if !self.in_flight.contains(&kind) {
            self.in_flight.insert(kind);
            return true;
        }

        // The parked run re-resolves every source, so only the paths merge.
        let parked = self.parked.entry(kind).or_default();
        for path in changed {
            if !parked.contains(&path) {
                parked.push(path);
            }
        }
        false
    }

    /// Mark a run finished. Returns the parked run to start next, if any;
    /// the task stays in flight in that case.
    pub fn finish(&mut self, kind: TaskKind) -> Option<Vec<PathBuf>> {
        match self.parked.remove(&kind) {
            Some(changed) => Some(changed),
            None => {
                self.in_flight.remove(&kind);
                None
            }
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.in_flight.contains(&kind)
    }

    #[cfg(test)]
    pub fn is_parked(&self, kind: TaskKind) -> bool {
        self.parked.contains_key(&kind)
    }
}

/// Task Actor - runs tasks and reports their outcome
pub struct TaskActor {
    rx: mpsc::Receiver<TaskMsg>,
    /// Completion messages come back through this sender
    self_tx: mpsc::Sender<TaskMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    /// Files each run read go back to the watcher
    fs_tx: mpsc::Sender<FsMsg>,
    config: Arc<ProjectConfig>,
    queue: RunQueue,
    /// Tasks whose last run failed
    failed: FxHashSet<TaskKind>,
}

impl TaskActor {
    pub fn new(
        rx: mpsc::Receiver<TaskMsg>,
        self_tx: mpsc::Sender<TaskMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        fs_tx: mpsc::Sender<FsMsg>,
        config: Arc<ProjectConfig>,
    ) -> Self {
        Self {
            rx,
            self_tx,
            ws_tx,
            fs_tx,
            config,
            queue: RunQueue::default(),
            failed: FxHashSet::default(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                TaskMsg::Run { kind, changed } => {
                    if self.queue.request(kind, changed) {
                        self.spawn(kind);
                    } else {
                        crate::debug!("task"; "{} in flight, queued", kind);
                    }
                }
                TaskMsg::Finished(run) => {
                    let kind = run.kind;
                    if let Some(msg) = inputs_message(&run) {
                        let _ = self.fs_tx.send(msg).await;
                    }
                    self.report(run).await;
                    if self.queue.finish(kind).is_some() {
                        self.spawn(kind);
                    }
                }
                TaskMsg::Shutdown => {
                    crate::debug!("task"; "shutting down");
                    break;
                }
            }
        }
    }

    fn spawn(&self, kind: TaskKind) {
        let config = Arc::clone(&self.config);
        let tx = self.self_tx.clone();
        tokio::task::spawn_blocking(move || {
            let run = run_task(kind, &config);
            let _ = tx.blocking_send(TaskMsg::Finished(run));
        });
    }

    /// Log the run and notify browsers.
    async fn report(&mut self, run: TaskRun) {
        let kind = run.kind;

        if let Some(msg) = reload_message(&run, &self.config) {
            let _ = self.ws_tx.send(msg).await;
        }

        if run.is_success() {
            match &run.result {
                Ok(report) if report.written.is_empty() => status_unchanged(&run.summary()),
                _ => status_success(&run.summary()),
            }
            if self.failed.remove(&kind) {
                let _ = self.ws_tx.send(WsMsg::ClearError).await;
            }
            return;
        }

        let errors = run.errors();
        status_error(&format!("{kind} failed"), &errors.join("\n"));
        self.failed.insert(kind);
        let _ = self
            .ws_tx
            .send(WsMsg::Error {
                task: kind.to_string(),
                error: errors.join("\n"),
            })
            .await;
    }
}

/// New watch inputs for a finished run. Runs that read nothing (failed
/// early, or a task without includes) keep the previous set.
fn inputs_message(run: &TaskRun) -> Option<FsMsg> {
    match &run.result {
        Ok(report) if !report.inputs.is_empty() => Some(FsMsg::Inputs {
            kind: run.kind,
            files: report.inputs.clone(),
        }),
        _ => None,
    }
}

/// Browser notification for a finished run.
///
/// Stylesheets outside the served root cannot be swapped in place and fall
/// back to a full reload, as does `inject_changes = false`.
fn reload_message(run: &TaskRun, config: &ProjectConfig) -> Option<WsMsg> {
    let reason = run.kind.to_string();
    match run.reload() {
        ReloadScope::None => None,
        ReloadScope::Full => Some(WsMsg::Reload { reason }),
        ReloadScope::Css(files) => {
            if !config.serve.inject_changes {
                return Some(WsMsg::Reload { reason });
            }
            let paths: Option<Vec<String>> = files
                .iter()
                .map(|file| url_path(file, &config.serve.root))
                .collect();
            Some(match paths {
                Some(paths) => WsMsg::Css { paths },
                None => WsMsg::Reload { reason },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::task::{TaskError, TaskReport};
    use std::path::Path;
    use std::time::Duration;

    fn run_with(kind: TaskKind, result: Result<TaskReport, TaskError>) -> TaskRun {
        TaskRun {
            kind,
            result,
            duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_queue_starts_idle_task() {
        let mut queue = RunQueue::default();
        assert!(queue.request(TaskKind::Style, vec![]));
        assert!(queue.is_running(TaskKind::Style));
        // Another task is independent
        assert!(queue.request(TaskKind::Script, vec![]));
    }

    #[test]
    fn test_queue_parks_one_run_while_in_flight() {
        let mut queue = RunQueue::default();
        assert!(queue.request(TaskKind::Style, vec!["a.scss".into()]));
        assert!(!queue.request(TaskKind::Style, vec!["b.scss".into()]));
        assert!(!queue.request(TaskKind::Style, vec!["b.scss".into(), "c.scss".into()]));
        assert!(queue.is_parked(TaskKind::Style));

        // One parked run, carrying every path seen while in flight
        let next = queue.finish(TaskKind::Style).unwrap();
        assert_eq!(next, vec![PathBuf::from("b.scss"), PathBuf::from("c.scss")]);
        assert!(queue.is_running(TaskKind::Style));
        assert!(!queue.is_parked(TaskKind::Style));

        assert_eq!(queue.finish(TaskKind::Style), None);
        assert!(!queue.is_running(TaskKind::Style));
        assert!(queue.request(TaskKind::Style, vec![]));
    }

    #[test]
    fn test_css_reload_uses_served_urls() {
        let config = test_config_at(Path::new("/site/builder"), "");
        let mut report = TaskReport::default();
        report.reload = ReloadScope::Css(vec![config.style.output.clone()]);
        let run = run_with(TaskKind::Style, Ok(report));

        match reload_message(&run, &config) {
            Some(WsMsg::Css { paths }) => assert_eq!(paths, vec!["/project/www/css/main.css"]),
            other => panic!("expected css message, got {other:?}"),
        }
    }

    #[test]
    fn test_css_outside_root_or_disabled_reloads() {
        let config = test_config_at(Path::new("/site/builder"), "[serve]\nroot = \"css\"\n");
        let mut report = TaskReport::default();
        report.reload = ReloadScope::Css(vec![config.style.output.clone()]);
        let run = run_with(TaskKind::Style, Ok(report));
        assert!(matches!(reload_message(&run, &config), Some(WsMsg::Reload { .. })));

        let config = test_config_at(
            Path::new("/site/builder"),
            "[serve]\ninject_changes = false\n",
        );
        assert!(matches!(reload_message(&run, &config), Some(WsMsg::Reload { .. })));
    }

    #[test]
    fn test_no_message_without_changes() {
        let config = test_config_at(Path::new("/site/builder"), "");
        let run = run_with(TaskKind::Fonts, Ok(TaskReport::default()));
        assert!(reload_message(&run, &config).is_none());

        let failed = run_with(TaskKind::Script, Err(TaskError::tool("oxc", "boom")));
        assert!(reload_message(&failed, &config).is_none());
    }

    #[test]
    fn test_inputs_forwarded_only_when_read() {
        let report = TaskReport {
            inputs: vec![PathBuf::from("/p/css/parts/b.part")],
            ..TaskReport::default()
        };
        match inputs_message(&run_with(TaskKind::Style, Ok(report))) {
            Some(FsMsg::Inputs { kind, files }) => {
                assert_eq!(kind, TaskKind::Style);
                assert_eq!(files, vec![PathBuf::from("/p/css/parts/b.part")]);
            }
            other => panic!("expected inputs, got {other:?}"),
        }

        assert!(inputs_message(&run_with(TaskKind::Style, Ok(TaskReport::default()))).is_none());
        let failed = run_with(TaskKind::Script, Err(TaskError::tool("oxc", "boom")));
        assert!(inputs_message(&failed).is_none());
    }

    #[test]
    fn test_full_reload_names_task() {
        let config = test_config_at(Path::new("/site/builder"), "");
        let report = TaskReport {
            reload: ReloadScope::Full,
            ..TaskReport::default()
        };
        match reload_message(&run_with(TaskKind::Html, Ok(report)), &config) {
            Some(WsMsg::Reload { reason }) => assert_eq!(reason, "html"),
            other => panic!("expected reload, got {other:?}"),
        }
    }
}
