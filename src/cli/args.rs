//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live-coding playground: compile and run a sectioned document on every save
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: liveplay.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "liveplay.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a sample document and a default config
    #[command(visible_alias = "i")]
    Init {
        /// Document to create (default: playground.json)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Compile and run a document once
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        args: PlayArgs,
    },

    /// Re-run a document on every save and publish changes to host clients
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: PlayArgs,

        /// WebSocket port for host clients (0 disables)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Arguments shared by `run` and `watch`
#[derive(clap::Args, Debug, Clone)]
pub struct PlayArgs {
    /// Document file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Prefix for `./` asset requires
    #[arg(short, long)]
    pub asset_root: Option<String>,

    /// JavaScript engine command, e.g. "node -"
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Split the document into sections (JSON object)
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub split: Option<bool>,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }

    /// Document arguments of `run`/`watch`.
    pub fn play_args(&self) -> Option<&PlayArgs> {
        match &self.command {
            Commands::Run { args } | Commands::Watch { args, .. } => Some(args),
            Commands::Init { .. } => None,
        }
    }
}
