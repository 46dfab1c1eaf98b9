//! Live-reload script injection into HTML responses.

use crate::embed::serve::script_tag;

/// Inject the live-reload script when the body is HTML and live reload is on.
pub fn maybe_inject_livereload(body: Vec<u8>, content_type: &str, live_reload: bool) -> Vec<u8> {
    if live_reload && content_type.starts_with("text/html") {
        inject_script(&body, script_tag().as_bytes())
    } else {
        body
    }
}

/// Insert `script` before the last `</body>`, or append it when there is none.
fn inject_script(content: &[u8], script: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let pos = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + script.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(script);
    result.extend_from_slice(&content[pos..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types::{CSS, HTML};

    fn inject(html: &str) -> String {
        String::from_utf8(maybe_inject_livereload(html.into(), HTML, true)).unwrap()
    }

    #[test]
    fn test_injected_before_last_body_close() {
        let out = inject("<html><body><p>x</p></BODY></html>");
        assert_eq!(
            out,
            format!("<html><body><p>x</p>{}</BODY></html>", script_tag())
        );
    }

    #[test]
    fn test_appended_without_body() {
        let out = inject("<p>fragment</p>");
        assert_eq!(out, format!("<p>fragment</p>{}", script_tag()));
    }

    #[test]
    fn test_untouched_when_not_html_or_disabled() {
        let css = b"body{}".to_vec();
        assert_eq!(maybe_inject_livereload(css.clone(), CSS, true), css);

        let html = b"<body></body>".to_vec();
        assert_eq!(maybe_inject_livereload(html.clone(), HTML, false), html);
    }
}
