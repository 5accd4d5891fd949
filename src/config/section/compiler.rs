//! `[compiler]` section configuration.
//!
//! ```toml
//! [compiler]
//! command = ["npx", "babel", "--presets", "react"]   # empty = built-in
//! ```

use serde::Deserialize;

use super::check_command;
use crate::config::types::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// External transpiler; the built-in one is used when empty.
    pub command: Vec<String>,
}

impl CompilerConfig {
    pub const COMMAND: FieldPath = FieldPath::new("compiler.command");

    pub fn is_builtin(&self) -> bool {
        self.command.is_empty()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.is_builtin() {
            check_command(&self.command, Self::COMMAND, diag);
        }
    }
}
