//! Image optimization: every matched file is optimized in parallel and
//! written under `image.output`, mirroring its path below the glob base.

use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};
use crate::pipeline::discover::SourceFile;
use crate::pipeline::image::optimize;
use crate::pipeline::write::{WriteOutcome, write_if_changed};
use rayon::prelude::*;
use std::path::PathBuf;

pub struct ImageTask;

impl Task for ImageTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Image
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let files = ctx.discover(self)?;
        let results: Vec<_> = files
            .par_iter()
            .map(|file| process_one(ctx, file))
            .collect();

        let mut report = TaskReport::default();
        for result in results {
            match result {
                Ok((path, outcome)) => report.record(path, outcome),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.fail(e),
            }
        }
        report.reload = ReloadScope::full_if(!report.written.is_empty());
        Ok(report)
    }
}

fn process_one(
    ctx: &TaskContext<'_>,
    file: &SourceFile,
) -> Result<(PathBuf, WriteOutcome), TaskError> {
    let image = &ctx.config.image;
    let data = ctx.read(&file.path)?;
    let original = data.len();
    let bytes = if image.optimize {
        optimize(&file.path, &data, image.jpeg_quality)
            .map_err(|e| TaskError::invalid(ctx.display(&file.path), e))?
    } else {
        data
    };

    let dest = image.output.join(file.relative());
    let outcome = write_if_changed(&dest, &bytes).map_err(|source| TaskError::Write {
        path: ctx.display(&dest),
        source,
    })?;
    crate::debug!("image"; "{}: {} -> {} bytes", ctx.display(&file.path).display(), original, bytes.len());
    Ok((dest, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::{project, write};
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn png(color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(24, 24, Rgba(color));
        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
        img.write_with_encoder(encoder).unwrap();
        out
    }

    #[test]
    fn test_n_inputs_n_outputs_never_larger() {
        let (_dir, config) = project("");
        let root = config.get_root();
        write(root, "img/a.png", png([255, 0, 0, 255]));
        write(root, "img/icons/b.png", png([0, 0, 255, 128]));
        write(root, "img/readme.txt", "copied as-is");

        let report = ImageTask.run(&TaskContext::new(&config)).unwrap();
        assert!(report.is_success());
        assert_eq!(report.written.len(), 3);

        for rel in ["a.png", "icons/b.png", "readme.txt"] {
            let out = fs::metadata(config.image.output.join(rel)).unwrap().len();
            let src = fs::metadata(root.join("img").join(rel)).unwrap().len();
            assert!(out > 0 && out <= src, "{rel}: {out} > {src}");
        }
    }

    #[test]
    fn test_corrupt_file_does_not_stop_others() {
        let (_dir, config) = project("");
        let root = config.get_root();
        write(root, "img/good.png", png([1, 2, 3, 255]));
        write(root, "img/bad.png", "definitely not a png");

        let report = ImageTask.run(&TaskContext::new(&config)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.written, vec![config.image.output.join("good.png")]);
        assert!(!config.image.output.join("bad.png").exists());
    }

    #[test]
    fn test_unchanged_outputs_do_not_reload() {
        let (_dir, config) = project("");
        write(config.get_root(), "img/a.png", png([9, 9, 9, 255]));

        let ctx = TaskContext::new(&config);
        assert_eq!(ImageTask.run(&ctx).unwrap().reload, ReloadScope::Full);
        let second = ImageTask.run(&ctx).unwrap();
        assert_eq!(second.unchanged.len(), 1);
        assert_eq!(second.reload, ReloadScope::None);
    }
}
