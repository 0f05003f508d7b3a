//! CLI commands

mod completions;
mod init;
mod list;
mod run;

use std::path::PathBuf;

use tracing::debug;

use gantry_core::config::{load_config, load_config_from_dir, project_root, Config};
use gantry_tasks::{build_registry, TaskRegistry};

use crate::cli::Cli;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use list::ListCommand;
pub use run::RunCommand;

/// A loaded configuration together with the registry built from it
pub struct Project {
    pub config: Config,
    pub config_path: PathBuf,
    pub registry: TaskRegistry,
}

/// Load the configuration named by `--file`, or the nearest one above the
/// working directory, and build its task registry.
pub fn load_project(cli: &Cli) -> anyhow::Result<Project> {
    let cwd = std::env::current_dir()?;
    let (config, config_path) = match cli.file {
        Some(ref file) => (load_config(file)?, file.clone()),
        None => load_config_from_dir(&cwd)?,
    };

    // Tasks run in the config file's directory, independent of the cwd
    let config_path = if config_path.is_absolute() {
        config_path
    } else {
        cwd.join(config_path)
    };
    debug!(path = %config_path.display(), "loaded project config");

    let registry = build_registry(&config, &project_root(&config_path))?;
    Ok(Project {
        config,
        config_path,
        registry,
    })
}
