//! Live-reload message protocol.
//!
//! JSON over WebSocket, server to browser only:
//!
//! - `reload`: full page reload
//! - `css`: swap the stylesheets served under `paths` in place
//! - `error`: show a task failure for `duration_ms`
//! - `clear_error`: hide the failure notice
//! - `connected`: sent once per client

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Changed stylesheets, as URL paths under the served root.
    Css { paths: Vec<String> },

    Error {
        task: String,
        error: String,
        duration_ms: u64,
    },

    #[serde(rename = "clear_error")]
    ClearError,

    Connected { version: String },
}

impl HotReloadMessage {
    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn css(paths: Vec<String>) -> Self {
        Self::Css { paths }
    }

    pub fn error(task: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self::Error {
            task: task.into(),
            error: error.into(),
            duration_ms,
        }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_message() {
        let json = HotReloadMessage::reload("script").to_json();
        assert_eq!(json, r#"{"type":"reload","reason":"script"}"#);
    }

    #[test]
    fn test_css_message() {
        let json = HotReloadMessage::css(vec!["/project/www/css/main.css".into()]).to_json();
        assert_eq!(json, r#"{"type":"css","paths":["/project/www/css/main.css"]}"#);
    }

    #[test]
    fn test_error_and_clear() {
        let json = HotReloadMessage::error("style", "css/main.scss: expected \";\"", 3000).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["task"], "style");
        assert_eq!(value["duration_ms"], 3000);

        assert_eq!(HotReloadMessage::ClearError.to_json(), r#"{"type":"clear_error"}"#);
    }

    #[test]
    fn test_connected_carries_version() {
        let parsed: HotReloadMessage =
            serde_json::from_str(&HotReloadMessage::connected().to_json()).unwrap();
        assert_eq!(
            parsed,
            HotReloadMessage::Connected {
                version: env!("CARGO_PKG_VERSION").to_string()
            }
        );
    }
}
