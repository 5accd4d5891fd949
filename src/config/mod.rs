//! Playground configuration management for `liveplay.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── util.rs        # Config file lookup
//! └── mod.rs         # PlayConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section        | Purpose                                           |
//! |----------------|---------------------------------------------------|
//! | `[workspace]`  | Section split, edit debounce, preprocessing       |
//! | `[compiler]`   | Built-in or external transpiler                   |
//! | `[sandbox]`    | Engine command, app name, asset root, event id    |
//! | `[vendor]`     | Vendor components registered at startup          |
//! | `[serve]`      | WebSocket link for host clients (watch mode)      |
//!
//! Every section is optional; a missing config file means all defaults.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{CompilerConfig, SandboxConfig, ServeConfig, VendorConfig, WorkspaceConfig};
pub use types::{ConfigDiagnostics, ConfigError};

use crate::cli::{Cli, Commands};
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing liveplay.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub vendor: VendorConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl PlayConfig {
    /// Load configuration for the parsed command line.
    ///
    /// Searches upward from cwd for the config file; without one every
    /// section keeps its default. `init` skips loading and validation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        if cli.is_init() {
            return Ok(Self {
                config_path: cwd.join(&cli.config),
                root: cwd,
                ..Self::default()
            });
        }

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = path;
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {} ignored: {}", path.display(), ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve a path against the config root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        let Some(args) = cli.play_args() else {
            return;
        };

        Self::update_option(&mut self.sandbox.asset_root, args.asset_root.as_ref());
        Self::update_option(&mut self.workspace.split, args.split.as_ref());
        if let Some(engine) = &args.engine {
            self.sandbox.engine = engine.split_whitespace().map(str::to_owned).collect();
        }

        if let Commands::Watch { port, .. } = &cli.command {
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, collecting every error before returning.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.workspace.validate(&mut diag);
        self.compiler.validate(&mut diag);
        self.sandbox.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PlayConfig {
    let (parsed, ignored) = PlayConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<PlayConfig, _> = toml::from_str("[workspace\nsplit = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[sandbox]\napp_name = \"Demo\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = PlayConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.sandbox.app_name, "Demo");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "liveplay",
            "watch",
            "doc.json",
            "--asset-root",
            "/static",
            "--engine",
            "deno run -",
            "--split=false",
            "--port",
            "0",
        ])
        .unwrap();
        let mut config = test_parse_config("[serve]\nport = 9000");
        config.apply_command_options(&cli);

        assert_eq!(config.sandbox.asset_root, "/static");
        assert_eq!(config.sandbox.engine, ["deno", "run", "-"]);
        assert!(!config.workspace.split);
        assert!(!config.serve.is_enabled());
    }

    #[test]
    fn test_run_keeps_config_port() {
        let cli = Cli::try_parse_from(["liveplay", "run", "doc.json"]).unwrap();
        let mut config = test_parse_config("[serve]\nport = 9000");
        config.apply_command_options(&cli);
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.sandbox.engine, ["node", "-"]);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[workspace]\ndebounce_ms = 0\n[sandbox]\napp_name = \"\"\nengine = []",
        );
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err:?}");
        };
        assert_eq!(diag.errors().len(), 3);
    }

    #[test]
    fn test_root_join() {
        let config = PlayConfig {
            root: PathBuf::from("/play"),
            ..PlayConfig::default()
        };
        assert_eq!(config.root_join("doc.json"), PathBuf::from("/play/doc.json"));
    }
}
