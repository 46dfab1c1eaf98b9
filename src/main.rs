//! kiln - front-end asset task runner.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod pipeline;
mod reload;
mod task;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ProjectConfig;
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(ProjectConfig::load(&cli)?);

    match cli.command() {
        Commands::Build { .. } => cli::build::build(&config).map(|_| ()),
        Commands::Watch { .. } => cli::watch::watch(config),
        Commands::Webserver { .. } => cli::serve::serve(config, false),
        Commands::Clean => cli::clean::clean(&config),
        Commands::Default { .. } => run_default(config),
    }
}

/// Build once, then serve and watch until Ctrl+C.
///
/// Task failures in the initial build are reported but do not stop the
/// server; watch mode re-runs the failed tasks on the next change.
fn run_default(config: Arc<ProjectConfig>) -> Result<()> {
    let summary = cli::build::build(&config);
    if let Err(e) = summary {
        log!("build"; "{:#}", e);
    }
    if core::is_shutdown() {
        return Ok(());
    }
    cli::serve::serve(config, true)
}
