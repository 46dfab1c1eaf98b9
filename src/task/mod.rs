//! Named asset tasks.
//!
//! ```text
//! task/
//! ├── kind.rs      # TaskKind and its names
//! ├── graph.rs     # Dependency levels
//! ├── runner.rs    # Aggregate build and single runs
//! ├── report.rs    # TaskReport, ReloadScope
//! ├── error.rs     # TaskError
//! └── style.rs, script.rs, image.rs, fonts.rs, html.rs, icon.rs, sprite.rs
//! ```
//!
//! Every task is a zero-sized type implementing [`Task`]. Sources are
//! resolved on each run so files added while watching are picked up.

mod error;
mod fonts;
pub mod graph;
mod html;
mod icon;
mod image;
mod kind;
mod report;
pub mod runner;
mod script;
mod sprite;
mod style;

pub use error::TaskError;
pub use kind::TaskKind;
pub use report::{ReloadScope, TaskReport};

use crate::config::ProjectConfig;
use crate::pipeline::discover::{SourceFile, discover};
use crate::pipeline::write::{WriteOutcome, write_if_changed};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

pub trait Task: Send + Sync {
    fn kind(&self) -> TaskKind;

    /// Source globs, relative to the project root.
    fn sources<'a>(&self, config: &'a ProjectConfig) -> &'a [String] {
        config.sources(self.kind())
    }

    /// Globs whose changes re-run this task in watch mode.
    fn watch_globs(&self, config: &ProjectConfig) -> Vec<String> {
        self.sources(config).to_vec()
    }

    /// Files the task currently reads that its globs may not match, such
    /// as include targets. Watch mode binds them at startup; after that
    /// each run's [`TaskReport::inputs`] replaces them.
    fn inputs(&self, _ctx: &TaskContext<'_>) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Run once. `Err` aborts the invocation; per-file problems are
    /// collected in the report instead.
    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError>;
}

/// The task implementing `kind`.
pub fn task(kind: TaskKind) -> &'static dyn Task {
    match kind {
        TaskKind::Style => &style::StyleTask,
        TaskKind::Icon => &icon::IconTask,
        TaskKind::Sprite => &sprite::SpriteTask,
        TaskKind::Script => &script::ScriptTask,
        TaskKind::Fonts => &fonts::FontsTask,
        TaskKind::Image => &image::ImageTask,
        TaskKind::Html => &html::HtmlTask,
    }
}

/// Everything a task run may read.
pub struct TaskContext<'a> {
    pub config: &'a ProjectConfig,
}

impl<'a> TaskContext<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        self.config.get_root()
    }

    /// Files currently matched by the task's sources.
    pub fn discover(&self, task: &dyn Task) -> Result<Vec<SourceFile>, TaskError> {
        Ok(discover(self.root(), task.sources(self.config))?)
    }

    /// Root-relative form of `path` for messages.
    pub fn display(&self, path: &Path) -> PathBuf {
        self.config.root_relative(path)
    }

    /// Variables shared by every external command.
    pub fn env(&self) -> FxHashMap<String, String> {
        let mut vars = FxHashMap::default();
        vars.insert("KILN_ROOT".into(), self.root().display().to_string());
        vars.insert(
            "KILN_OUTPUT_DIR".into(),
            self.config.build.output.display().to_string(),
        );
        vars
    }

    /// Write an output and record the outcome.
    pub fn write(
        &self,
        report: &mut TaskReport,
        path: &Path,
        bytes: &[u8],
    ) -> Result<WriteOutcome, TaskError> {
        let outcome = write_if_changed(path, bytes).map_err(|source| TaskError::Write {
            path: self.display(path),
            source,
        })?;
        report.record(path.to_path_buf(), outcome);
        Ok(outcome)
    }

    /// Read a source file.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, TaskError> {
        std::fs::read(path).map_err(|source| TaskError::Read {
            path: self.display(path),
            source,
        })
    }
}
