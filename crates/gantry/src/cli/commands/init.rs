//! Init command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_core::config::write_default_config;

use crate::cli::{output, Cli};

/// Write a starter gantry.toml
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(long)]
    pub force: bool,

    /// Directory to write the configuration into (default: current directory)
    #[arg(value_name = "DIR")]
    pub path: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, "executing init command");
        let dir = match self.path {
            Some(ref path) => path.clone(),
            None => std::env::current_dir()?,
        };

        let config_path = write_default_config(&dir, self.force)?;

        if !cli.quiet {
            output::success(&format!(
                "Created {}",
                output::path_style().apply_to(config_path.display())
            ));
            println!("  Run `gantry list` to see the available tasks.");
        }
        Ok(())
    }
}
