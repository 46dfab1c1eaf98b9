//! Line provenance for assembled bundles.
//!
//! Bundles are built by concatenating expanded files, so every bundle line
//! comes from one line of one source (or from generated glue). A
//! [`LineMap`] records that, and [`LineMap::compose`] pushes the map a
//! minifier produced for the bundle back onto the original files.

use super::TransformError;
use super::include::Expanded;
use parcel_sourcemap::{OriginalLocation, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Origin {
    source: u32,
    line: u32,
}

/// Origin of each line of a bundle under construction.
#[derive(Debug, Default)]
pub struct LineMap {
    /// Display name and content of each source.
    sources: Vec<(String, String)>,
    lines: Vec<Option<Origin>>,
}

impl LineMap {
    /// Register a source, returning its index. Names are deduplicated.
    pub fn add_source(&mut self, name: &str, content: &str) -> u32 {
        let index = match self.sources.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.sources.push((name.to_string(), content.to_string()));
                self.sources.len() - 1
            }
        };
        index as u32
    }

    /// Lines with no source, such as bundle glue.
    pub fn push_generated(&mut self, count: usize) {
        self.lines.extend(std::iter::repeat_n(None, count));
    }

    /// `count` lines that all come from one source line.
    pub fn push_from(&mut self, source: u32, line: u32, count: usize) {
        self.lines
            .extend(std::iter::repeat_n(Some(Origin { source, line }), count));
    }

    /// Lines of an include expansion, in order. `name` gives the display
    /// name of each file the expansion read.
    pub fn push_expanded(&mut self, expanded: &Expanded, name: impl Fn(usize) -> String) {
        let indexes: Vec<u32> = (0..expanded.files.len())
            .map(|i| self.add_source(&name(i), &expanded.sources[i]))
            .collect();
        self.lines.extend(expanded.lines.iter().map(|origin| {
            Some(Origin {
                source: indexes[origin.file],
                line: origin.line,
            })
        }));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Rewrite `generated`, a map whose sources are lines of the bundle, so
    /// that it points into the original sources instead.
    pub fn compose(&self, generated: &str) -> Result<String, TransformError> {
        let generated = SourceMap::from_json("/", generated).map_err(map_error)?;

        let mut map = SourceMap::new("/");
        for (name, content) in &self.sources {
            let index = map.add_source(name);
            map.set_source_content(index as usize, content)
                .map_err(map_error)?;
        }

        for mapping in generated.get_mappings() {
            let Some(original) = mapping.original else {
                continue;
            };
            let Some(Some(origin)) = self.lines.get(original.original_line as usize) else {
                continue;
            };
            let name = original
                .name
                .and_then(|n| generated.get_name(n).ok())
                .map(|n| map.add_name(n));
            map.add_mapping(
                mapping.generated_line,
                mapping.generated_column,
                Some(OriginalLocation::new(
                    origin.line,
                    original.original_column,
                    origin.source,
                    name,
                )),
            );
        }

        map.to_json(None).map_err(map_error)
    }
}

fn map_error(err: parcel_sourcemap::SourceMapError) -> TransformError {
    TransformError::new(format!("source map: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity map over `lines` bundle lines, one mapping per line.
    fn line_map_json(lines: u32) -> String {
        let mut map = SourceMap::new("/");
        let source = map.add_source("bundle.js");
        for line in 0..lines {
            map.add_mapping(line, 0, Some(OriginalLocation::new(line, 0, source, None)));
        }
        map.to_json(None).unwrap()
    }

    #[test]
    fn test_compose_points_at_original_files() {
        let mut lines = LineMap::default();
        lines.push_generated(1);
        let a = lines.add_source("lib/a.js", "a();\n");
        lines.push_from(a, 0, 1);
        let b = lines.add_source("lib/b.js", "\nb();\n");
        lines.push_from(b, 1, 1);
        assert_eq!(lines.len(), 3);

        let json = lines.compose(&line_map_json(3)).unwrap();
        let map: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(map["sources"], serde_json::json!(["lib/a.js", "lib/b.js"]));
        assert_eq!(map["sourcesContent"][1], "\nb();\n");

        let mut parsed = SourceMap::from_json("/", &json).unwrap();
        let mappings = parsed.get_mappings();
        assert_eq!(mappings.len(), 2);
        let found = parsed.find_closest_mapping(2, 0).unwrap();
        let original = found.original.unwrap();
        assert_eq!((original.source, original.original_line), (1, 1));
    }

    #[test]
    fn test_sources_deduplicated() {
        let mut lines = LineMap::default();
        assert_eq!(lines.add_source("a.css", ""), 0);
        assert_eq!(lines.add_source("b.css", ""), 1);
        assert_eq!(lines.add_source("a.css", ""), 0);
    }
}
