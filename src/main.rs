//! liveplay - a live-coding playground for sectioned JavaScript documents.

mod actor;
mod cli;
mod config;
mod core;
mod diagnostics;
mod document;
mod logger;
mod protocol;
mod resolver;
mod sandbox;
mod utils;
mod worker;
mod workspace;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PlayConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PlayConfig::load(&cli)?;

    match &cli.command {
        Commands::Init { file } => cli::init::init_playground(&config, file.as_deref()),
        Commands::Run { args } => {
            if !cli::run::run_document(&config, &args.file)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Watch { args, .. } => cli::watch::watch_document(config, &args.file),
    }
}
