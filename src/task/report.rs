use super::TaskError;
use crate::pipeline::write::WriteOutcome;
use std::path::PathBuf;

/// What connected browsers should do after a task run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReloadScope {
    /// Nothing the browser sees changed.
    #[default]
    None,
    /// Re-fetch these stylesheets in place.
    Css(Vec<PathBuf>),
    /// Reload the page.
    Full,
}

impl ReloadScope {
    /// Full reload when anything was written.
    pub fn full_if(changed: bool) -> Self {
        if changed { Self::Full } else { Self::None }
    }

    /// Stylesheet injection for the written `.css` files.
    pub fn css(written: &[PathBuf]) -> Self {
        let sheets: Vec<_> = written
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "css"))
            .cloned()
            .collect();
        if sheets.is_empty() {
            Self::None
        } else {
            Self::Css(sheets)
        }
    }
}

/// Outcome of one task invocation.
#[derive(Debug, Default)]
pub struct TaskReport {
    pub written: Vec<PathBuf>,
    /// Outputs whose bytes were already up to date.
    pub unchanged: Vec<PathBuf>,
    /// Per-file failures; unrelated files were still processed.
    pub failures: Vec<TaskError>,
    pub reload: ReloadScope,
    /// Files read through includes or imports. Watch mode re-runs the task
    /// when one of them changes, even if no source glob matches it.
    pub inputs: Vec<PathBuf>,
}

impl TaskReport {
    pub fn record(&mut self, path: PathBuf, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written.push(path),
            WriteOutcome::Unchanged => self.unchanged.push(path),
        }
    }

    pub fn fail(&mut self, error: TaskError) {
        self.failures.push(error);
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `2 written, 1 unchanged`, or `no changes`.
    pub fn summary(&self) -> String {
        if self.written.is_empty() && self.unchanged.is_empty() && self.failures.is_empty() {
            return "no changes".to_string();
        }
        let mut parts = Vec::new();
        if !self.written.is_empty() {
            parts.push(format!("{} written", self.written.len()));
        }
        if !self.unchanged.is_empty() {
            parts.push(format!("{} unchanged", self.unchanged.len()));
        }
        if !self.failures.is_empty() {
            parts.push(format!("{} failed", self.failures.len()));
        }
        parts.join(", ")
    }
}
