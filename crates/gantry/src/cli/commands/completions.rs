//! Shell completions generation command

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::{output, Cli};

/// Generate shell completions
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "executing completions command");

        let mut out: Box<dyn Write> = match self.output {
            Some(ref path) => Box::new(std::fs::File::create(path)?),
            None => Box::new(io::stdout()),
        };
        generate(self.shell, &mut Cli::command(), "gantry", &mut out);
        out.flush()?;

        if let (Some(path), false) = (&self.output, cli.quiet) {
            output::success(&format!(
                "Completions written to {}",
                output::path_style().apply_to(path.display())
            ));
        }
        Ok(())
    }
}
