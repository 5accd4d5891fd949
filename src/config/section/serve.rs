//! `[serve]` section configuration.
//!
//! The WebSocket link host pages connect to in watch mode.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # 0.0.0.0 makes it reachable from the LAN
//! port = 5277                 # 0 disables the link
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
        }
    }
}

impl ServeConfig {
    pub fn is_enabled(&self) -> bool {
        self.port != 0
    }
}
