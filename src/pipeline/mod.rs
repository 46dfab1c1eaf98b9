//! Reusable transformation steps shared by the tasks.
//!
//! | Module      | Step                                               |
//! |-------------|----------------------------------------------------|
//! | `discover`  | glob resolution, glob bases, watch roots           |
//! | `include`   | `//= file` include directives, line origins        |
//! | `bundle`    | script module graph, ESM/CommonJS rewrite          |
//! | `sourcemap` | bundle line map, map composition                   |
//! | `css`       | lightningcss prefixing, minify, source map         |
//! | `js`        | oxc minify/mangle, source map                      |
//! | `image`     | PNG/JPEG re-encode, SVG compaction                 |
//! | `pack`      | binary-tree rectangle packing                      |
//! | `write`     | output writes that skip unchanged bytes            |

pub mod bundle;
pub mod css;
pub mod discover;
pub mod image;
pub mod include;
pub mod js;
pub mod pack;
pub mod sourcemap;
pub mod write;

use thiserror::Error;

/// A transformation step rejected its input.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Output of a text transformation that may carry a source map.
#[derive(Debug)]
pub struct Processed {
    pub code: String,
    /// Source map JSON, when requested.
    pub map: Option<String>,
}
