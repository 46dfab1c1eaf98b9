use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};

/// Pages are served as they are; a run only asks browsers to reload.
pub struct HtmlTask;

impl Task for HtmlTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Html
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let pages = ctx.discover(self)?;
        crate::debug!("html"; "{} page{}", pages.len(), crate::utils::plural_s(pages.len()));
        Ok(TaskReport {
            reload: ReloadScope::full_if(!pages.is_empty()),
            ..TaskReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};

    #[test]
    fn test_reload_only_when_pages_exist() {
        let (dir, config) = project("");
        let ctx = TaskContext::new(&config);
        assert_eq!(HtmlTask.run(&ctx).unwrap().reload, ReloadScope::None);

        write(dir.path(), "index.html", "<html></html>");
        let report = HtmlTask.run(&ctx).unwrap();
        assert_eq!(report.reload, ReloadScope::Full);
        assert!(report.written.is_empty());
    }
}
