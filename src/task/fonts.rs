use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};

/// Copies font files into `fonts.output`, keeping their relative paths.
pub struct FontsTask;

impl Task for FontsTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Fonts
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let mut report = TaskReport::default();
        for file in ctx.discover(self)? {
            let data = match ctx.read(&file.path) {
                Ok(data) => data,
                Err(e) => {
                    report.fail(e);
                    continue;
                }
            };
            let dest = ctx.config.fonts.output.join(file.relative());
            ctx.write(&mut report, &dest, &data)?;
        }
        report.reload = ReloadScope::full_if(!report.written.is_empty());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};
    use std::fs;

    #[test]
    fn test_fonts_copied_preserving_layout() {
        let (_dir, config) = project("");
        let root = config.get_root();
        write(root, "fonts/open-sans/regular.woff2", b"wOF2");
        write(root, "fonts/icons.ttf", b"\0\x01\0\0");

        let report = FontsTask.run(&TaskContext::new(&config)).unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(
            fs::read(config.fonts.output.join("open-sans/regular.woff2")).unwrap(),
            b"wOF2"
        );

        let again = FontsTask.run(&TaskContext::new(&config)).unwrap();
        assert_eq!(again.unchanged.len(), 2);
        assert_eq!(again.reload, ReloadScope::None);
    }
}
