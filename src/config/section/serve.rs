//! `[serve]` section configuration.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (0.0.0.0 for LAN access)
//! port = 3000                 # HTTP port number
//! root = ".."                 # Served directory (relative to project root)
//! livereload_port = 35729     # WebSocket port for the reload client
//! notify_ms = 3000            # How long the in-page error notice stays up
//! inject_changes = true       # Swap stylesheets in place instead of reloading
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
    pub root: PathBuf,
    pub livereload_port: u16,
    pub notify_ms: u64,
    pub inject_changes: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            root: "..".into(),
            livereload_port: 35729,
            notify_ms: 3000,
            inject_changes: true,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error(FieldPath::new("serve.port"), "port must not be 0");
        }
        if self.livereload_port == 0 {
            diag.error(FieldPath::new("serve.livereload_port"), "port must not be 0");
        }
        if self.port == self.livereload_port && self.port != 0 {
            diag.error(
                FieldPath::new("serve.livereload_port"),
                "live-reload port must differ from the HTTP port",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_serve_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.livereload_port, 35729);
        assert_eq!(config.serve.notify_ms, 3000);
        assert!(config.serve.inject_changes);
    }

    #[test]
    fn test_serve_interface_variants() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_serve_zero_port_rejected() {
        let config = test_parse_config("[serve]\nport = 0");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_serve_port_clash_rejected() {
        let config = test_parse_config("[serve]\nport = 35729");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
