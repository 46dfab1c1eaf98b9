//! Stylesheet post-processing with lightningcss.
//!
//! Vendor prefixes for the configured browserslist, optional minification
//! and a source map for the bundle.

use super::{Processed, TransformError};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

pub struct CssOptions<'a> {
    /// Name recorded in diagnostics and the source map.
    pub filename: &'a str,
    /// Browserslist queries; empty disables prefixing.
    pub browsers: &'a [String],
    pub minify: bool,
    pub sourcemap: bool,
}

pub fn targets(browsers: &[String]) -> Result<Targets, TransformError> {
    if browsers.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(browsers)
        .map_err(|e| TransformError::new(format!("invalid browserslist query: {e}")))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Prefix, optionally minify, and print `source`.
pub fn process_css(source: &str, options: &CssOptions<'_>) -> Result<Processed, TransformError> {
    let targets = targets(options.browsers)?;

    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: options.filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TransformError::new(e.to_string()))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| TransformError::new(e.to_string()))?;

    let mut source_map = if options.sourcemap {
        let mut map = SourceMap::new("/");
        map.add_source(options.filename);
        map.set_source_content(0, source)
            .map_err(|e| TransformError::new(format!("source map: {e:?}")))?;
        Some(map)
    } else {
        None
    };

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: options.minify,
            source_map: source_map.as_mut(),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TransformError::new(e.to_string()))?;

    let map = match source_map.as_mut() {
        Some(map) => Some(
            map.to_json(None)
                .map_err(|e| TransformError::new(format!("source map: {e:?}")))?,
        ),
        None => None,
    };

    Ok(Processed {
        code: result.code,
        map,
    })
}
