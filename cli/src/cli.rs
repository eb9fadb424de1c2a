//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Collect diagnostic dumps from processes in Windows containers
#[derive(Parser)]
#[command(
    name = "procdump",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file [default: ~/.procdump/config.yaml]
    #[arg(
        long = "config",
        global = true,
        env = "PROCDUMP_CONFIG",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Trigger a dump in a container and wait for its log
    Dump(commands::dump::DumpArgs),

    /// List the processes running in a container
    Ps(commands::TargetArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Default `tracing` directive for the requested verbosity.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be read or written, or
    /// output cannot be serialized. Dump failures are reported through the
    /// exit code instead.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            config_file,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            no_color,
            quiet,
            json,
            config: config_file,
        });

        match command {
            Command::Dump(args) => commands::dump::run(&app, args).await,
            Command::Ps(args) => commands::ps::run(&app, &args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
