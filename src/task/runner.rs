//! Task execution.
//!
//! [`run_build`] runs the selected tasks level by level (see [`graph`]),
//! in parallel inside a level. [`run_task`] runs a single task and is shared
//! with watch mode.
//!
//! [`graph`]: super::graph

use super::graph::{self, GraphError};
use super::{ReloadScope, TaskContext, TaskError, TaskKind, TaskReport, task};
use crate::config::ProjectConfig;
use crate::core::is_shutdown;
use crate::logger::ProgressLine;
use crate::utils::plural_s;
use crate::{debug, log};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// One task invocation and its result.
#[derive(Debug)]
pub struct TaskRun {
    pub kind: TaskKind,
    pub result: Result<TaskReport, TaskError>,
    pub duration: Duration,
}

impl TaskRun {
    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_ok_and(TaskReport::is_success)
    }

    /// Every error of the run, one message each.
    pub fn errors(&self) -> Vec<String> {
        match &self.result {
            Ok(report) => report.failures.iter().map(ToString::to_string).collect(),
            Err(e) => vec![e.to_string()],
        }
    }

    pub fn reload(&self) -> ReloadScope {
        match &self.result {
            Ok(report) => report.reload.clone(),
            Err(_) => ReloadScope::None,
        }
    }

    /// `style: 2 written (35ms)`
    pub fn summary(&self) -> String {
        let detail = match &self.result {
            Ok(report) => report.summary(),
            Err(e) => format!("failed: {e}"),
        };
        format!("{}: {detail} ({}ms)", self.kind, self.duration.as_millis())
    }
}

/// Run one task against `config`.
pub fn run_task(kind: TaskKind, config: &ProjectConfig) -> TaskRun {
    let start = Instant::now();
    let result = task(kind).run(&TaskContext::new(config));
    TaskRun {
        kind,
        result,
        duration: start.elapsed(),
    }
}

/// Result of an aggregate build.
#[derive(Debug)]
pub struct BuildSummary {
    pub runs: Vec<TaskRun>,
    pub duration: Duration,
}

impl BuildSummary {
    pub fn failed(&self) -> Vec<TaskKind> {
        self.runs
            .iter()
            .filter(|run| !run.is_success())
            .map(|run| run.kind)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.runs.iter().all(TaskRun::is_success)
    }
}

/// Run the selected tasks, honoring dependency levels unless unordered.
///
/// Failures never stop the remaining tasks.
pub fn run_build(config: &ProjectConfig) -> Result<BuildSummary, GraphError> {
    let start = Instant::now();
    let selected = config.build.selected_tasks();
    let levels = graph::levels(&selected, config.build.ordered)?;
    log_ordering(config.build.ordered, &levels);

    let progress = ProgressLine::new(&[("tasks", selected.len())]);
    let mut runs = Vec::with_capacity(selected.len());
    for level in &levels {
        if is_shutdown() {
            break;
        }
        let level_runs: Vec<TaskRun> = level
            .par_iter()
            .map(|&kind| {
                let run = run_task(kind, config);
                progress.inc("tasks");
                run
            })
            .collect();
        runs.extend(level_runs);
    }
    progress.finish();

    let summary = BuildSummary {
        runs,
        duration: start.elapsed(),
    };
    log_summary(&summary);
    Ok(summary)
}

fn log_ordering(ordered: bool, levels: &[Vec<TaskKind>]) {
    if ordered {
        let rendered: Vec<String> = levels
            .iter()
            .map(|level| {
                level
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        log!("build"; "ordered: {}", rendered.join(" -> "));
    } else {
        log!("build"; "unordered: all tasks run at once (generated stylesheets may be stale)");
    }
}

fn log_summary(summary: &BuildSummary) {
    for run in &summary.runs {
        if run.is_success() {
            debug!("build"; "{}", run.summary());
        } else {
            for error in run.errors() {
                log!("error"; "{}: {}", run.kind, error);
            }
        }
    }

    let failed = summary.failed();
    let ms = summary.duration.as_millis();
    if failed.is_empty() {
        log!("build"; "{} task{} done in {}ms", summary.runs.len(), plural_s(summary.runs.len()), ms);
    } else {
        let names: Vec<_> = failed.iter().map(|k| k.name()).collect();
        log!("build"; "{} of {} tasks failed ({}) in {}ms", failed.len(), summary.runs.len(), names.join(", "), ms);
    }
}
