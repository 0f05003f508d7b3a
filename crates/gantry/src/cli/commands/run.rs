//! Run command: resolve targets and execute them with their prerequisites

use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use gantry_tasks::{
    Engine, ProcessRunner, TaskError, TaskEvent, TaskId, TaskRegistry, TaskReporter,
    TracingReporter,
};

use super::load_project;
use crate::cli::{output, Cli, OutputFormat};

/// Run targets and their prerequisites
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Targets to run, e.g. `buildAll` or `build.frontend` (default: the
    /// configured default target)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Show execution plan without running
    #[arg(long)]
    pub dry_run: bool,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(targets = ?self.targets, dry_run = self.dry_run, "executing run command");
        let project = load_project(cli)?;
        let targets = resolve_targets(&self.targets, &project.registry)?;
        let runner = ProcessRunner::new().with_force_stream(cli.verbose);

        if self.dry_run {
            let engine = Engine::new(&project.registry, &runner);
            return print_plan(cli, &project.registry, &targets, &engine.plan(&targets)?);
        }

        let reporter: Arc<dyn TaskReporter> = if cli.quiet || cli.format == OutputFormat::Json {
            Arc::new(TracingReporter)
        } else {
            Arc::new(ConsoleReporter::new(cli.verbose))
        };

        let engine = Engine::new(&project.registry, &runner).with_reporter(reporter);
        let summary = engine.execute(&targets)?;

        if cli.format == OutputFormat::Json {
            let output = serde_json::json!({
                "targets": targets,
                "executed": summary.executed,
                "duration_ms": summary.duration.as_millis() as u64,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Ok(())
    }
}

/// Turn command-line targets into task ids, falling back to the default
/// target. Every target must exist before anything runs.
pub fn resolve_targets(
    requested: &[String],
    registry: &TaskRegistry,
) -> Result<Vec<TaskId>, TaskError> {
    if requested.is_empty() {
        let default = registry
            .default_target()
            .cloned()
            .ok_or(TaskError::NoDefaultTarget)?;
        info!(target = %default, "no target given, using default");
        return Ok(vec![default]);
    }

    requested
        .iter()
        .map(|target| {
            let id = TaskId::parse(target)?;
            registry.lookup(&id)?;
            Ok(id)
        })
        .collect()
}

fn print_plan(
    cli: &Cli,
    registry: &TaskRegistry,
    targets: &[TaskId],
    plan: &[TaskId],
) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        let output = serde_json::json!({
            "targets": targets,
            "plan": plan,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    let names: Vec<&str> = targets.iter().map(TaskId::as_str).collect();
    output::info(&format!(
        "{} for {}",
        output::plural(plan.len(), "task"),
        names.join(", ")
    ));
    println!();
    for (i, id) in plan.iter().enumerate() {
        let work = registry.lookup(id)?.work().describe();
        println!(
            "  {:>2}. {} {}",
            i + 1,
            output::task_style().apply_to(id),
            style(work).dim()
        );
    }
    println!();
    println!("{}", style("[DRY RUN - no tasks will be executed]").yellow().bold());
    Ok(())
}

/// Console reporter with one line per task
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { id, description } => {
                println!(
                    "  {} {} {}",
                    style("▸").dim(),
                    output::task_style().apply_to(id),
                    if self.verbose {
                        style(format!("({})", description)).dim().to_string()
                    } else {
                        String::new()
                    }
                );
            }
            TaskEvent::Satisfied { id } => {
                if self.verbose {
                    println!(
                        "  {} {} {}",
                        style("○").dim(),
                        style(id).dim(),
                        style("(already done)").dim()
                    );
                }
            }
            TaskEvent::Completed { id, duration } => {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(id).green(),
                    style(output::duration(*duration)).dim()
                );
            }
            TaskEvent::Failed {
                id,
                duration,
                error,
            } => {
                println!(
                    "  {} {} {} {}",
                    style("✗").red(),
                    style(id).red(),
                    style(output::duration(*duration)).dim(),
                    style(error).red().dim()
                );
            }
            TaskEvent::Finished {
                executed,
                succeeded,
                duration,
            } => {
                println!();
                println!(
                    "  {} {} ran ({})",
                    if *succeeded {
                        style("✓").green().bold()
                    } else {
                        style("✗").red().bold()
                    },
                    output::plural(*executed, "task"),
                    output::duration(*duration)
                );
            }
        }
    }
}
