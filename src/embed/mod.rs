//! Resources compiled into the binary.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - The live-reload client, minified by `build.rs` with the error
//!   overlay stylesheet inlined

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL the server answers with the live-reload client.
    pub const LIVERELOAD_PATH: &str = "/__kiln/livereload.js";

    /// Variables for livereload.js.
    pub struct LivereloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for LivereloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__KILN_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-reload client with WebSocket port injection.
    pub const LIVERELOAD_JS: Template<LivereloadVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/livereload.min.js")));

    /// Tag injected into served HTML pages.
    pub fn script_tag() -> String {
        format!(r#"<script src="{LIVERELOAD_PATH}" defer></script>"#)
    }
}
