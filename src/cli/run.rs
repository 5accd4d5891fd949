//! `liveplay run`: one compile and one run, synchronously.
//!
//! Drives the same workspace state machine as watch mode, but carries out
//! each effect inline instead of handing it to an actor.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::queue::SegQueue;

use crate::actor::preprocess::preprocess;
use crate::actor::workspace::show_status;
use crate::config::PlayConfig;
use crate::document::parse_document;
use crate::protocol::HostMessage;
use crate::resolver::{ModuleResolver, VendorRegistry};
use crate::sandbox::{Console, Evaluator, LogLevel, ProcessEvaluator, Sandbox, SandboxEvent, Transport};
use crate::worker::{compile, transpiler_for};
use crate::workspace::{Effect, Workspace};
use crate::{debug, log};

/// Events queued by the sandbox, drained into the workspace after each step.
#[derive(Clone, Default)]
struct EventQueue(Arc<SegQueue<SandboxEvent>>);

impl Transport for EventQueue {
    fn send(&mut self, event: SandboxEvent) {
        self.0.push(event);
    }
}

/// Console output goes straight to the terminal in one-shot mode.
struct PrintConsole;

impl Console for PrintConsole {
    fn write(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Log | LogLevel::Info => println!("{message}"),
            LogLevel::Warn | LogLevel::Error => log!("console"; "{}", message),
        }
    }
}

/// Compile and run `file` once. Returns whether it ran without a displayed error.
pub fn run_document(config: &PlayConfig, file: &Path) -> Result<bool> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let model = parse_document(&raw, config.workspace.split);
    debug!("run"; "{} section(s) loaded", model.len());

    let resolver = ModuleResolver::new(
        config.sandbox.asset_root.clone(),
        VendorRegistry::from_components(&config.vendor.components),
    );
    let evaluator = ProcessEvaluator::new(config.sandbox.engine.clone())
        .with_cwd(config.root.clone())
        .with_timeout(config.sandbox.run_timeout());
    let events = EventQueue::default();
    let sandbox = Sandbox::new(
        &config.sandbox.id,
        &config.sandbox.app_name,
        resolver,
        evaluator,
        Box::new(events.clone()),
    )
    .with_console(Box::new(PrintConsole));

    let workspace = Workspace::new(model, config.sandbox.id.clone())
        .with_preprocess(config.workspace.preprocess);

    let mut driver = Driver {
        config,
        workspace,
        sandbox,
        events,
    };
    driver.run()?;

    let workspace = &driver.workspace;
    show_status(workspace);
    if workspace.displayed_error().is_none()
        && let Some(mounted) = driver.sandbox.mounted()
    {
        debug!("run"; "mounted {}: {}", mounted.app, mounted.tree);
    }
    Ok(workspace.displayed_error().is_none())
}

struct Driver<'a, E: Evaluator> {
    config: &'a PlayConfig,
    workspace: Workspace,
    sandbox: Sandbox<E>,
    events: EventQueue,
}

impl<E: Evaluator> Driver<'_, E> {
    fn run(&mut self) -> Result<()> {
        let mut queue = VecDeque::new();

        self.sandbox.mount();
        self.drain_events(&mut queue);
        queue.extend(self.workspace.start());

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Compile { seq, source } => {
                    let transpiler = transpiler_for(&self.config.compiler.command);
                    let reply = compile(transpiler.as_ref(), &source);
                    queue.extend(self.workspace.on_compiled(seq, reply));
                }
                Effect::Preprocess(request) => {
                    let reply = preprocess(&self.config.workspace.preprocess_command, &request)?;
                    queue.extend(self.workspace.on_preprocessed(reply));
                }
                Effect::Run(code) => {
                    queue.extend(self.workspace.on_run_started());
                    let outcome = self.sandbox.run_application(&code);
                    debug!("run"; "{:?}", outcome);
                    self.drain_events(&mut queue);
                }
                Effect::Post(HostMessage::CodeChange { .. }) => {}
                Effect::Post(message) => debug!("run"; "{}", message.to_json()),
            }
        }

        self.sandbox.reset_application();
        Ok(())
    }

    fn drain_events(&mut self, queue: &mut VecDeque<Effect>) {
        while let Some(event) = self.events.0.pop() {
            queue.extend(self.workspace.on_sandbox_event(event));
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn config_with_engine(script: &str) -> PlayConfig {
        let mut config = PlayConfig::default();
        config.workspace.split = false;
        config.sandbox.engine = vec!["sh".into(), "-c".into(), script.into()];
        config
    }

    fn write_doc(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("doc.js");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_clean_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_doc(&dir, "var a = 1;\n");
        let config = config_with_engine(
            r#"cat >/dev/null; printf '\001mount {"app":"App","tree":{}}\n'"#,
        );
        assert!(run_document(&config, &file).unwrap());
    }

    #[test]
    fn test_compile_error_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_doc(&dir, "var = ;\n");
        let config = config_with_engine("cat >/dev/null");
        assert!(!run_document(&config, &file).unwrap());
    }

    #[test]
    fn test_runtime_fault_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_doc(&dir, "var a = 1;\n");
        let config = config_with_engine(
            r#"cat >/dev/null; printf '\001fault {"name":"TypeError","message":"x is not a function"}\n'"#,
        );
        assert!(!run_document(&config, &file).unwrap());
    }

    #[test]
    fn test_runaway_run_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_doc(&dir, "while (true) {}\n");
        let mut config = config_with_engine("exec sleep 5");
        config.sandbox.timeout_ms = 200;

        let started = std::time::Instant::now();
        assert!(!run_document(&config, &file).unwrap());
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
    }

    #[test]
    fn test_sample_document_runs_on_node() {
        if which::which("node").is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("playground.json");
        std::fs::write(&file, crate::document::sample::sample_json()).unwrap();
        assert!(run_document(&PlayConfig::default(), &file).unwrap());
    }

    #[test]
    fn test_jsx_syntax_error_is_a_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_doc(&dir, "var a = 1;\nvar el = <View>;\n");
        // The engine would report success; the error must come from the compiler.
        let config = config_with_engine(
            r#"cat >/dev/null; printf '\001mount {"app":"App","tree":{}}\n'"#,
        );
        assert!(!run_document(&config, &file).unwrap());
    }

    #[test]
    fn test_missing_document_is_error() {
        let config = config_with_engine("cat >/dev/null");
        assert!(run_document(&config, Path::new("/nonexistent/liveplay/doc.js")).is_err());
    }
}
