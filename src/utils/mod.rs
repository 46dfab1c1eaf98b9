//! Shared helpers: external commands, MIME types and paths.

pub mod exec;
pub mod mime;
pub mod path;

/// Return "s" suffix for plural counts
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
