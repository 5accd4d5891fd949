//! Evaluator backed by an external JavaScript engine process.
//!
//! The wrapped unit is piped to the engine's stdin (`node -` by default).
//! Each run is a fresh process, so teardown has nothing to release.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::evaluator::{Console, Evaluator, Fault, FaultKind, LogLevel, MountedTree};
use super::shim::WrappedUnit;
use crate::debug;
use crate::resolver::ModuleResolver;
use crate::utils::exec::{Cmd, TimedOut, strip_ansi};

const RECORD_MARK: char = '\u{1}';

/// `Name: message` header of an error printed by the engine.
static ERROR_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Za-z]*(?:Error|Exception)): (.*)$").unwrap()
});

/// Messages left behind when the previous render root was torn down halfway.
const STALE_HOST_PATTERNS: [&str; 2] = ["getHostNode", "unmountComponent"];

#[derive(Debug, Deserialize)]
struct LogRecord {
    level: LogLevel,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MountRecord {
    app: String,
    #[serde(default)]
    tree: Value,
}

pub struct ProcessEvaluator {
    command: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
    uncaught: Vec<Fault>,
}

impl ProcessEvaluator {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            cwd: None,
            timeout: None,
            uncaught: Vec::new(),
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Kill a run that has not finished after `limit`.
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }
}

impl Evaluator for ProcessEvaluator {
    fn execute(
        &mut self,
        unit: &WrappedUnit,
        _resolver: &ModuleResolver,
        console: &mut dyn Console,
    ) -> Result<MountedTree, Fault> {
        let mut cmd = Cmd::from_slice(&self.command).stdin(&unit.source);
        if let Some(cwd) = &self.cwd {
            cmd = cmd.cwd(cwd);
        }
        if let Some(limit) = self.timeout {
            cmd = cmd.timeout(limit);
        }
        let output = cmd.output().map_err(|e| match e.downcast_ref::<TimedOut>() {
            Some(t) => Fault::new(
                "TimeoutError",
                format!("{} did not finish within {}ms", unit.app_name, t.limit.as_millis()),
            ),
            None => Fault::new("EngineError", format!("{e:#}")),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut mounted = None;
        let mut fault = None;
        for line in stdout.lines() {
            match parse_line(line) {
                Record::Log(log) => console.write(log.level, &log.message),
                Record::Plain(text) => console.write(LogLevel::Log, text),
                Record::Mount(m) => {
                    mounted = Some(MountedTree {
                        app: m.app,
                        tree: m.tree,
                    })
                }
                Record::Fault(f) => fault = Some(classify(f)),
                Record::Uncaught(f) => self.uncaught.push(classify(f)),
                Record::Unknown(kind) => debug!("sandbox"; "ignoring `{}` record", kind),
            }
        }

        if let Some(fault) = fault {
            return Err(fault);
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fault_from_stderr(&stderr, &output.status.to_string()));
        }
        mounted.ok_or_else(|| {
            Fault::new(
                "Error",
                format!("Application {} did not mount", unit.app_name),
            )
        })
    }

    fn drain_uncaught(&mut self) -> Vec<Fault> {
        std::mem::take(&mut self.uncaught)
    }
}

enum Record<'a> {
    Log(LogRecord),
    Mount(MountRecord),
    Fault(Fault),
    Uncaught(Fault),
    Plain(&'a str),
    Unknown(&'a str),
}

fn parse_line(line: &str) -> Record<'_> {
    let Some(rest) = line.strip_prefix(RECORD_MARK) else {
        return Record::Plain(line);
    };
    let (kind, json) = rest.split_once(' ').unwrap_or((rest, "null"));
    let parsed = match kind {
        "log" => serde_json::from_str(json).map(Record::Log),
        "mount" => serde_json::from_str(json).map(Record::Mount),
        "fault" => serde_json::from_str(json).map(Record::Fault),
        "uncaught" => serde_json::from_str(json).map(Record::Uncaught),
        _ => return Record::Unknown(kind),
    };
    parsed.unwrap_or(Record::Unknown(kind))
}

fn classify(fault: Fault) -> Fault {
    let stale = STALE_HOST_PATTERNS
        .iter()
        .any(|p| fault.message.contains(p));
    if stale {
        fault.with_kind(FaultKind::StaleHostNode)
    } else {
        fault
    }
}

/// The engine died before the wrapper could report, e.g. a parse error.
fn fault_from_stderr(stderr: &str, status: &str) -> Fault {
    let text = strip_ansi(stderr).trim().to_string();
    let fault = match ERROR_HEADER.captures(&text) {
        Some(caps) => Fault::new(&caps[1], &caps[2]),
        None => {
            let last = text.lines().rev().find(|l| !l.trim().is_empty());
            Fault::new(
                "Error",
                last.map_or_else(|| format!("engine exited with {status}"), str::to_string),
            )
        }
    };
    classify(fault.with_stack(text))
}
