//! Image optimization.
//!
//! Lossless-ish re-encoding with the `image` crate for PNG/JPEG and a compact
//! rewrite through usvg for SVG. The optimized bytes are only used when they
//! are smaller than the original.

use super::TransformError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageFormat;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Png,
    Jpeg,
    Svg,
    Other,
}

fn kind_of(path: &Path) -> Kind {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => Kind::Png,
        Some("jpg" | "jpeg") => Kind::Jpeg,
        Some("svg") => Kind::Svg,
        _ => Kind::Other,
    }
}

/// Optimize one image. Never returns more bytes than `data`.
pub fn optimize(path: &Path, data: &[u8], jpeg_quality: u8) -> Result<Vec<u8>, TransformError> {
    let optimized = match kind_of(path) {
        Kind::Png => Some(encode_png(data)?),
        Kind::Jpeg => Some(encode_jpeg(data, jpeg_quality)?),
        Kind::Svg => compact_svg(data)?,
        Kind::Other => None,
    };

    Ok(match optimized {
        Some(bytes) if !bytes.is_empty() && bytes.len() < data.len() => bytes,
        _ => data.to_vec(),
    })
}

fn encode_png(data: &[u8]) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Png)
        .map_err(|e| TransformError::new(format!("invalid PNG: {e}")))?;
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| TransformError::new(format!("PNG encode failed: {e}")))?;
    Ok(out)
}

fn encode_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>, TransformError> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| TransformError::new(format!("invalid JPEG: {e}")))?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| TransformError::new(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

/// Rewrite an SVG through usvg without indentation.
///
/// usvg is built without text support, so documents with `<text>` are left
/// alone rather than losing their text.
fn compact_svg(data: &[u8]) -> Result<Option<Vec<u8>>, TransformError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| TransformError::new(format!("invalid SVG: {e}")))?;

    if String::from_utf8_lossy(data).contains("<text") {
        return Ok(None);
    }

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(Some(tree.to_string(&write_options).into_bytes()))
}
