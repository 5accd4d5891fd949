//! `[sandbox]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sandbox]
//! id = "liveplay"              # Tags every sandbox event
//! asset_root = "/static"       # Prefix for `./` asset requires
//! engine = ["node", "-"]       # Reads the wrapped unit on stdin
//! app_name = "App"             # Name every registered component is stored under
//! timeout_ms = 5000            # Kill a run after this long, 0 waits forever
//! ```

use std::time::Duration;

use serde::Deserialize;

use super::check_command;
use crate::config::types::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub id: String,
    pub asset_root: String,
    pub engine: Vec<String>,
    pub app_name: String,
    pub timeout_ms: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            id: "liveplay".into(),
            asset_root: String::new(),
            engine: vec!["node".into(), "-".into()],
            app_name: "App".into(),
            timeout_ms: 5000,
        }
    }
}

impl SandboxConfig {
    pub const ENGINE: FieldPath = FieldPath::new("sandbox.engine");
    pub const APP_NAME: FieldPath = FieldPath::new("sandbox.app_name");

    /// Deadline for one evaluation; `None` when disabled.
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.app_name.trim().is_empty() {
            diag.error(Self::APP_NAME, "must not be empty");
        }
        check_command(&self.engine, Self::ENGINE, diag);
    }
}
