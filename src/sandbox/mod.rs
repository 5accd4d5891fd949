//! Execution sandbox.
//!
//! Runs compiled code against the host runtime and reports the outcome as
//! [`SandboxEvent`]s:
//!
//! ```text
//! Idle ──run──▶ Running ──┬─▶ success  (warnings may precede it)
//!                         ├─▶ error    (unless a warning was surfaced)
//!                         └─▶ stale root: clear, retry once, then error
//! ```
//!
//! Everything the sandbox touches (evaluator, transport, resolver, console)
//! is owned by it and injected at construction.

mod evaluator;
mod event;
mod line;
mod process;
mod shim;


pub use evaluator::{Console, Evaluator, Fault, FaultKind, LogConsole, LogLevel, MountedTree};
pub use event::{SandboxEvent, SandboxEventKind, Transport};
pub use process::ProcessEvaluator;
pub use shim::{WrappedUnit, prologue_lines, wrap};

use crate::debug;
use crate::resolver::ModuleResolver;
use line::LineExtractors;

/// A stale render root is cleared and retried at most this many times per run.
const MAX_SELF_HEAL: u32 = 1;

/// Host callbacks fired around each run.
pub struct SandboxHooks {
    on_run: Box<dyn FnMut() + Send>,
    on_error: Box<dyn FnMut(&Fault) + Send>,
}

impl SandboxHooks {
    pub fn on_run(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_run = Box::new(f);
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&Fault) + Send + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }
}

impl Default for SandboxHooks {
    fn default() -> Self {
        Self {
            on_run: Box::new(|| {}),
            on_error: Box::new(|_| {}),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success {
        /// Warning-level console messages surfaced during the run.
        warnings: usize,
        /// The first attempt hit a stale render root.
        self_healed: bool,
    },
    Failed {
        fault: Fault,
        /// False when a surfaced warning already explained the failure.
        reported: bool,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

pub struct Sandbox<E: Evaluator> {
    id: String,
    app_name: String,
    resolver: ModuleResolver,
    evaluator: E,
    transport: Box<dyn Transport>,
    console: Box<dyn Console>,
    hooks: SandboxHooks,
    extractors: LineExtractors,
    mounted: Option<MountedTree>,
    state: SandboxState,
    intercepting: bool,
    last_prologue: u32,
}

impl<E: Evaluator> Sandbox<E> {
    pub fn new(
        id: impl Into<String>,
        app_name: impl Into<String>,
        resolver: ModuleResolver,
        evaluator: E,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            id: id.into(),
            app_name: app_name.into(),
            resolver,
            evaluator,
            transport,
            console: Box::new(LogConsole),
            hooks: SandboxHooks::default(),
            extractors: LineExtractors::default(),
            mounted: None,
            state: SandboxState::Idle,
            intercepting: false,
            last_prologue: prologue_lines(),
        }
    }

    pub fn with_console(mut self, console: Box<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn with_hooks(mut self, hooks: SandboxHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn state(&self) -> SandboxState {
        self.state
    }

    pub fn mounted(&self) -> Option<&MountedTree> {
        self.mounted.as_ref()
    }

    /// Start intercepting uncaught faults and announce readiness.
    pub fn mount(&mut self) {
        self.intercepting = true;
        self.transport.send(SandboxEvent::ready(&self.id));
    }

    /// Report a fault raised outside a run, e.g. from a timer callback.
    /// The line is shifted back into user-code coordinates.
    pub fn intercept_uncaught(&mut self, fault: &Fault) {
        if !self.intercepting {
            return;
        }
        let mut message = format!("Uncaught {}", headline(fault));
        if let Some(line) = self.extractors.extract_user_line(fault, self.last_prologue) {
            message.push_str(&format!(" ({line})"));
        }
        self.transport.send(SandboxEvent::error(&self.id, message));
    }

    /// Tear down the mounted tree. Safe to call with nothing mounted.
    pub fn reset_application(&mut self) {
        if let Some(tree) = self.mounted.take() {
            self.evaluator.unmount(tree);
        }
    }

    pub fn run_application(&mut self, code: &str) -> RunOutcome {
        let mut heals = 0;
        loop {
            self.reset_application();
            (self.hooks.on_run)();

            self.state = SandboxState::Running;
            let (result, warnings) = self.run_once(code);
            self.state = SandboxState::Idle;

            match result {
                Ok(tree) => {
                    self.mounted = Some(tree);
                    self.transport.send(SandboxEvent::success(&self.id, code));
                    self.report_uncaught();
                    return RunOutcome::Success {
                        warnings,
                        self_healed: heals > 0,
                    };
                }
                Err(fault) if fault.kind == FaultKind::StaleHostNode && heals < MAX_SELF_HEAL => {
                    debug!("sandbox"; "stale render root, clearing and retrying");
                    heals += 1;
                    self.evaluator.clear_root();
                }
                Err(fault) => {
                    let reported = warnings == 0;
                    if reported {
                        let message = self.error_message(&fault);
                        self.transport.send(SandboxEvent::error(&self.id, message));
                        (self.hooks.on_error)(&fault);
                    }
                    return RunOutcome::Failed { fault, reported };
                }
            }
        }
    }

    /// Evaluate once with console interception scoped to this call.
    fn run_once(&mut self, code: &str) -> (Result<MountedTree, Fault>, usize) {
        let unit = wrap(code, &self.app_name, &self.resolver);
        self.last_prologue = unit.prologue_lines;

        let mut console = InterceptConsole {
            base: self.console.as_mut(),
            transport: self.transport.as_mut(),
            id: &self.id,
            warnings: 0,
        };
        let result = self.evaluator.execute(&unit, &self.resolver, &mut console);
        (result, console.warnings)
    }

    fn report_uncaught(&mut self) {
        for fault in self.evaluator.drain_uncaught() {
            self.intercept_uncaught(&fault);
        }
    }

    fn error_message(&self, fault: &Fault) -> String {
        let headline = headline(fault);
        match self.extractors.extract_user_line(fault, self.last_prologue) {
            Some(line) => format!("{headline} ({line})"),
            None => headline,
        }
    }
}

fn headline(fault: &Fault) -> String {
    if fault.name.is_empty() {
        fault.message.clone()
    } else {
        format!("{}: {}", fault.name, fault.message)
    }
}

/// Forwards to the base console and surfaces warning-level messages.
/// Lives only for the duration of one evaluation.
struct InterceptConsole<'a> {
    base: &'a mut dyn Console,
    transport: &'a mut dyn Transport,
    id: &'a str,
    warnings: usize,
}

impl Console for InterceptConsole<'_> {
    fn write(&mut self, level: LogLevel, message: &str) {
        self.base.write(level, message);
        if level.is_warning() {
            self.warnings += 1;
            self.transport.send(SandboxEvent::warning(self.id, message));
        }
    }
}
