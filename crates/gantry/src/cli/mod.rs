//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use gantry_core::{ConfigError, GantryError};
use gantry_tasks::TaskError;

use crate::exit_codes;
use commands::{CompletionsCommand, InitCommand, ListCommand, RunCommand};

/// Gantry - build-task orchestrator
///
/// Runs named build tasks and their prerequisites, each at most once.
/// With no subcommand the given targets (or the configured default) run.
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Stream the output of every command and show command lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: search upward for gantry.toml)
    #[arg(short, long, global = true, env = "GANTRY_CONFIG")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunCommand,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run targets and their prerequisites
    Run(RunCommand),

    /// List available tasks
    List(ListCommand),

    /// Write a starter gantry.toml
    Init(InitCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command, reporting any error on stderr
    pub fn execute(self) -> ExitCode {
        match self.dispatch() {
            Ok(()) => ExitCode::from(exit_codes::SUCCESS),
            Err(err) => {
                let code = exit_code(&err);
                debug!(code, error = %err, "command failed");
                report_error(&err);
                ExitCode::from(code)
            }
        }
    }

    fn dispatch(&self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            debug!(dir = %dir.display(), "changing working directory");
            std::env::set_current_dir(dir)
                .with_context(|| format!("cannot change directory to {}", dir.display()))?;
        }

        match self.command {
            Some(Commands::Run(ref cmd)) => cmd.execute(self),
            Some(Commands::List(ref cmd)) => cmd.execute(self),
            Some(Commands::Init(ref cmd)) => cmd.execute(self),
            Some(Commands::Completions(ref cmd)) => cmd.execute(self),
            None => self.run.execute(self),
        }
    }
}

/// Map an error to the process exit code
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(task_error) = err.downcast_ref::<TaskError>() {
        return if task_error.is_config_error() {
            exit_codes::CONFIG_ERROR
        } else {
            exit_codes::TASK_FAILED
        };
    }

    if let Some(gantry_error) = err.downcast_ref::<GantryError>() {
        if gantry_error.is_config_error() {
            return exit_codes::CONFIG_ERROR;
        }
    }

    if err.downcast_ref::<ConfigError>().is_some() {
        return exit_codes::CONFIG_ERROR;
    }

    exit_codes::ERROR
}

fn report_error(err: &anyhow::Error) {
    // Library errors already carry their cause in the message
    let message = if err.downcast_ref::<TaskError>().is_some()
        || err.downcast_ref::<GantryError>().is_some()
    {
        err.to_string()
    } else {
        format!("{err:#}")
    };
    output::error(&message);

    if let Some(GantryError::Config(ConfigError::NotFound(_))) = err.downcast_ref::<GantryError>() {
        output::hint("run `gantry init` to create a gantry.toml");
    }
}
