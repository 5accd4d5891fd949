//! `[workspace]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [workspace]
//! split = true                 # Treat the document as a JSON object of sections
//! debounce_ms = 250            # Quiet period before an edit is compiled
//! preprocess = false           # Route code and errors through a preprocessor
//! preprocess_command = ["node", "preprocess.js"]
//! ```

use serde::Deserialize;

use super::check_command;
use crate::config::types::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub split: bool,
    pub debounce_ms: u64,
    pub preprocess: bool,
    /// Receives one request JSON on stdin, prints the reply JSON.
    pub preprocess_command: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            split: true,
            debounce_ms: 250,
            preprocess: false,
            preprocess_command: Vec::new(),
        }
    }
}

impl WorkspaceConfig {
    pub const DEBOUNCE_MS: FieldPath = FieldPath::new("workspace.debounce_ms");
    pub const PREPROCESS_COMMAND: FieldPath = FieldPath::new("workspace.preprocess_command");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms == 0 {
            diag.error(Self::DEBOUNCE_MS, "must be greater than 0");
        }
        if self.preprocess {
            check_command(&self.preprocess_command, Self::PREPROCESS_COMMAND, diag);
        }
    }
}
