//! Script minification with oxc.

use super::{Processed, TransformError};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::path::PathBuf;

pub struct JsOptions<'a> {
    /// Name recorded in the source map.
    pub filename: &'a str,
    pub minify: bool,
    pub mangle: bool,
    pub sourcemap: bool,
}

/// Parse, optionally compress and mangle, and print `source`.
///
/// `source` is parsed as a classic script. Its top-level names stay global
/// and are never mangled.
pub fn process_js(source: &str, options: &JsOptions<'_>) -> Result<Processed, TransformError> {
    let allocator = Allocator::default();
    let source_type = SourceType::cjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let messages: Vec<_> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(TransformError::new(messages.join("\n")));
    }
    let mut program = ret.program;

    let codegen_options = CodegenOptions {
        minify: options.minify,
        comments: if options.minify {
            CommentOptions::disabled()
        } else {
            CommentOptions::default()
        },
        source_map_path: options.sourcemap.then(|| PathBuf::from(options.filename)),
        ..CodegenOptions::default()
    };

    let ret = if options.minify {
        let minifier_options = MinifierOptions {
            mangle: options.mangle.then(MangleOptions::default),
            compress: Some(CompressOptions::smallest()),
        };
        let minified = Minifier::new(minifier_options).minify(&allocator, &mut program);
        Codegen::new()
            .with_options(codegen_options)
            .with_scoping(minified.scoping)
            .build(&program)
    } else {
        Codegen::new().with_options(codegen_options).build(&program)
    };

    Ok(Processed {
        code: ret.code,
        map: ret.map.map(|map| map.to_json_string()),
    })
}
