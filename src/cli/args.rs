//! Command-line interface definitions.

use crate::task::TaskKind;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// kiln front-end asset task runner
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Config file path (default: kiln.toml)
    #[arg(short = 'C', long, global = true, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands (`default` when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every asset task once
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Watch sources and re-run the bound tasks on change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Start the asset server with live reload
    #[command(visible_alias = "serve")]
    Webserver {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Remove the output directory tree
    Clean,

    /// Build once, then serve and watch until interrupted
    Default {
        #[command(flatten)]
        build_args: BuildArgs,

        #[command(flatten)]
        serve_args: ServeArgs,
    },
}

/// Task selection arguments shared by build, watch and default.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Run all tasks in one parallel batch, ignoring dependency edges
    #[arg(long)]
    pub unordered: bool,

    /// Only run these tasks (e.g. `--only style script`)
    #[arg(long, value_name = "TASK", num_args = 1..)]
    pub only: Vec<TaskKind>,
}

/// Server arguments shared by webserver and default.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Subcommand with the implicit `default` filled in.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Default {
            build_args: BuildArgs::default(),
            serve_args: ServeArgs::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kiln").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_command_is_default() {
        let cli = parse(&[]);
        assert!(matches!(cli.command(), Commands::Default { .. }));
        assert_eq!(cli.config, PathBuf::from("kiln.toml"));
    }

    #[test]
    fn test_build_only_tasks() {
        let cli = parse(&["build", "--only", "style", "js:build", "--unordered"]);
        let Commands::Build { build_args } = cli.command() else {
            panic!("expected build");
        };
        assert!(build_args.unordered);
        assert_eq!(build_args.only, vec![TaskKind::Style, TaskKind::Script]);
    }

    #[test]
    fn test_serve_alias_and_port() {
        let cli = parse(&["serve", "-p", "8080", "--verbose"]);
        let Commands::Webserver { serve_args } = cli.command() else {
            panic!("expected webserver");
        };
        assert_eq!(serve_args.port, Some(8080));
        assert!(cli.verbose);
    }

    #[test]
    fn test_unknown_task_rejected() {
        let result = Cli::try_parse_from(["kiln", "build", "--only", "deploy"]);
        assert!(result.is_err());
    }
}
