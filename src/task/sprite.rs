//! Sprite sheet.
//!
//! Raster images are packed into one PNG; the generated SCSS carries a
//! `$<prefix><name>` map per sprite and a ready-made `.<prefix><name>` rule.
//! Names come from file stems, so `a.png` and `a.jpg` cannot both be
//! sprites; the later one is reported.

use super::{ReloadScope, Task, TaskContext, TaskError, TaskKind, TaskReport};
use crate::config::SpriteConfig;
use crate::pipeline::pack::{Packed, pack};
use ::image::codecs::png::{CompressionType, FilterType, PngEncoder};
use ::image::{RgbaImage, imageops};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Extensions the image crate is built to decode.
const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub struct SpriteTask;

struct Sprite {
    name: String,
    path: PathBuf,
    image: RgbaImage,
}

impl Task for SpriteTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Sprite
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<TaskReport, TaskError> {
        let mut report = TaskReport::default();
        let files: Vec<_> = ctx
            .discover(self)?
            .into_iter()
            .filter(|f| {
                f.path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| RASTER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        if files.is_empty() {
            return Ok(report);
        }

        let decoded: Vec<_> = files
            .par_iter()
            .map(|file| -> Result<Sprite, TaskError> {
                let data = ctx.read(&file.path)?;
                let image = ::image::load_from_memory(&data)
                    .map_err(|e| TaskError::invalid(ctx.display(&file.path), e))?
                    .to_rgba8();
                let stem = file
                    .path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Sprite {
                    name: stem,
                    path: file.path.clone(),
                    image,
                })
            })
            .collect();

        let mut sprites: Vec<Sprite> = Vec::new();
        for result in decoded {
            match result {
                Ok(sprite) => match sprites.iter().find(|s| s.name == sprite.name) {
                    Some(taken) => report.fail(TaskError::invalid(
                        ctx.display(&sprite.path),
                        format!(
                            "sprite name `{}` is already used by `{}`",
                            sprite.name,
                            ctx.display(&taken.path).display()
                        ),
                    )),
                    None => sprites.push(sprite),
                },
                Err(e) => report.fail(e),
            }
        }
        if sprites.is_empty() {
            return Ok(report);
        }

        let config = &ctx.config.sprite;
        let sizes: Vec<_> = sprites.iter().map(|s| s.image.dimensions()).collect();
        let packed = pack(&sizes, config.padding);

        let png = compose(&sprites, &packed)
            .map_err(|e| TaskError::invalid(ctx.display(&config.image), e))?;
        ctx.write(&mut report, &config.image, &png)?;
        ctx.write(
            &mut report,
            &config.stylesheet,
            stylesheet(config, &sprites, &packed).as_bytes(),
        )?;

        report.reload = ReloadScope::full_if(!report.written.is_empty());
        Ok(report)
    }
}

fn compose(sprites: &[Sprite], packed: &Packed) -> Result<Vec<u8>, ::image::ImageError> {
    let mut sheet = RgbaImage::new(packed.width, packed.height);
    for (sprite, place) in sprites.iter().zip(&packed.placements) {
        imageops::overlay(
            &mut sheet,
            &sprite.image,
            i64::from(place.x),
            i64::from(place.y),
        );
    }

    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    sheet.write_with_encoder(encoder)?;
    Ok(out)
}

/// Pixel value; zero is written without a unit.
fn px(value: i64) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("{value}px")
    }
}

fn stylesheet(config: &SpriteConfig, sprites: &[Sprite], packed: &Packed) -> String {
    let url = &config.image_url;
    let (total_w, total_h) = (i64::from(packed.width), i64::from(packed.height));
    let mut out = String::new();

    for (sprite, place) in sprites.iter().zip(&packed.placements) {
        let name = format!("{}{}", config.prefix, sprite.name);
        let (x, y) = (i64::from(place.x), i64::from(place.y));
        let (w, h) = sprite.image.dimensions();
        let (w, h) = (i64::from(w), i64::from(h));

        let _ = writeln!(
            out,
            "${name}: ({}, {}, {}, {}, {}, {}, {}, {}, '{url}', '{name}');",
            px(x),
            px(y),
            px(-x),
            px(-y),
            px(w),
            px(h),
            px(total_w),
            px(total_h),
        );
    }

    for (sprite, place) in sprites.iter().zip(&packed.placements) {
        let name = format!("{}{}", config.prefix, sprite.name);
        let (w, h) = sprite.image.dimensions();
        let _ = writeln!(
            out,
            "\n.{name} {{\n  background-image: url('{url}');\n  background-position: {} {};\n  width: {};\n  height: {};\n}}",
            px(-i64::from(place.x)),
            px(-i64::from(place.y)),
            px(i64::from(w)),
            px(i64::from(h)),
        );
    }
    out
}
