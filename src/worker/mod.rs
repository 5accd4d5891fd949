//! Compile worker: source text in, compiled code or a structured error out.
//!
//! The transpiler itself is opaque behind [`Transpiler`]. Replies use the
//! worker wire shape:
//!
//! ```text
//! { "type": "code",  "code": "..." }
//! { "type": "error", "error": { "message": "...", "lineNumber": 3 } }
//! ```
//!
//! The actor side (off-thread execution, sequence numbers) lives in
//! `actor::worker`.

mod command;
mod builtin;
mod jsx;

pub use command::CommandTranspiler;
pub use builtin::OxcTranspiler;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured compiler failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct CompileError {
    pub message: String,
    /// 1-based line in the submitted unit.
    pub line_number: Option<u32>,
}

impl CompileError {
    pub fn new(message: impl Into<String>, line_number: Option<u32>) -> Self {
        Self {
            message: message.into(),
            line_number,
        }
    }
}

/// Source-to-source compiler used by the worker.
pub trait Transpiler: Send + Sync {
    fn transpile(&self, source: &str) -> Result<String, CompileError>;
}

/// Transpiler for a configured command line; empty means built-in.
pub fn transpiler_for(command: &[String]) -> Arc<dyn Transpiler> {
    if command.is_empty() {
        Arc::new(OxcTranspiler)
    } else {
        Arc::new(CommandTranspiler::new(command.to_vec()))
    }
}

/// One response per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerReply {
    Code { code: String },
    Error { error: CompileError },
}

impl WorkerReply {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Run the transpiler, converting every failure (panics included) into an
/// `Error` reply.
pub fn compile(transpiler: &dyn Transpiler, source: &str) -> WorkerReply {
    match catch_unwind(AssertUnwindSafe(|| transpiler.transpile(source))) {
        Ok(Ok(code)) => WorkerReply::Code { code },
        Ok(Err(error)) => WorkerReply::Error { error },
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            WorkerReply::Error {
                error: CompileError::new(format!("Internal compiler error: {reason}"), None),
            }
        }
    }
}

/// 1-based line containing byte `offset` of `source`.
pub(crate) fn line_at(source: &str, offset: usize) -> u32 {
    let end = offset.min(source.len());
    let newlines = source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count();
    u32::try_from(newlines + 1).unwrap_or(u32::MAX)
}
