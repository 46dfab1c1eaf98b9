//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 100   # Quiet period per task before it re-runs
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_watch_debounce() {
        assert_eq!(test_parse_config("").watch.debounce_ms, 100);
        assert_eq!(test_parse_config("[watch]\ndebounce_ms = 250").watch.debounce_ms, 250);
    }
}
