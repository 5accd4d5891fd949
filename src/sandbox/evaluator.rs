//! The evaluator seam: whatever actually runs the wrapped unit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shim::WrappedUnit;
use crate::resolver::ModuleResolver;

/// Console levels reported by sandboxed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Warning-level output is surfaced to the coordinator.
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

/// Sink for console output produced while code runs.
pub trait Console: Send {
    fn write(&mut self, level: LogLevel, message: &str);
}

/// Default sink: the terminal log.
#[derive(Debug, Default)]
pub struct LogConsole;

impl Console for LogConsole {
    fn write(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Log | LogLevel::Info => crate::debug!("console"; "{}", message),
            LogLevel::Warn | LogLevel::Error => crate::log!("console"; "{}", message),
        }
    }
}

/// Typed classification of a fault, decided by the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaultKind {
    #[default]
    Thrown,
    /// The render root was torn down inconsistently; a fresh run recovers.
    StaleHostNode,
}

/// A fault raised while evaluating or booting the unit.
///
/// `line`, `line_number` and `stack` mirror the engine-specific places a
/// line can hide; see `line::LineExtractors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fault {
    pub name: String,
    pub message: String,
    #[serde(skip)]
    pub kind: FaultKind,
    pub line: Option<u32>,
    pub line_number: Option<u32>,
    pub stack: Option<String>,
}

impl Fault {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: FaultKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Output tree mounted into the sandbox root by a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct MountedTree {
    pub app: String,
    pub tree: Value,
}

/// Executes wrapped units.
pub trait Evaluator: Send {
    /// Evaluate the unit and boot its application into the render root.
    fn execute(
        &mut self,
        unit: &WrappedUnit,
        resolver: &ModuleResolver,
        console: &mut dyn Console,
    ) -> Result<MountedTree, Fault>;

    /// Tear down a previously mounted tree.
    fn unmount(&mut self, _tree: MountedTree) {}

    /// Wipe whatever is left in the render root after a failed teardown.
    fn clear_root(&mut self) {}

    /// Faults raised outside `execute` (timers, callbacks) since the last call.
    fn drain_uncaught(&mut self) -> Vec<Fault> {
        Vec::new()
    }
}
