//! External transpiler command (e.g. `npx babel --presets react`).
//!
//! Source goes to stdin; exit status 0 means stdout is the compiled code,
//! anything else means stderr describes the failure.

use std::sync::LazyLock;

use regex::Regex;

use super::{CompileError, Transpiler};
use crate::utils::exec::{Cmd, strip_ansi};

/// `(line:col)` as printed by babel, or `line N` / `:N:M` as printed by most others.
static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+):\d+\)|[Ll]ine (\d+)|:(\d+):\d+").unwrap());

#[derive(Debug, Clone)]
pub struct CommandTranspiler {
    command: Vec<String>,
}

impl CommandTranspiler {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Transpiler for CommandTranspiler {
    fn transpile(&self, source: &str) -> Result<String, CompileError> {
        let output = Cmd::from_slice(&self.command)
            .stdin(source)
            .output()
            .map_err(|e| CompileError::new(format!("{e:#}"), None))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = strip_ansi(stderr.trim()).into_owned();
        let message = if message.is_empty() {
            format!("`{}` exited with {}", self.command.join(" "), output.status)
        } else {
            message
        };
        Err(CompileError::new(message.clone(), error_line(&message)))
    }
}

fn error_line(message: &str) -> Option<u32> {
    let caps = ERROR_LINE.captures(message)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_line_shapes() {
        assert_eq!(error_line("SyntaxError: unknown: Unexpected token (4:2)"), Some(4));
        assert_eq!(error_line("error on line 7: bad"), Some(7));
        assert_eq!(error_line("stdin:12:5 - error"), Some(12));
        assert_eq!(error_line("no location here"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_success_passes_stdout() {
        let t = CommandTranspiler::new(vec!["cat".into()]);
        assert_eq!(t.transpile("let a = 1;\n").unwrap(), "let a = 1;\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_reports_stderr() {
        let t = CommandTranspiler::new(vec![
            "sh".into(),
            "-c".into(),
            "cat >/dev/null; echo 'SyntaxError: Unexpected token (2:5)' >&2; exit 1".into(),
        ]);
        let err = t.transpile("x").unwrap_err();
        assert_eq!(err.line_number, Some(2));
        assert!(err.message.starts_with("SyntaxError"));
    }

    #[test]
    fn test_missing_program_is_error_not_panic() {
        let t = CommandTranspiler::new(vec!["liveplay-no-such-transpiler".into()]);
        assert!(t.transpile("x").is_err());
    }
}
