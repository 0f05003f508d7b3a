//! List command

use clap::Args;
use console::style;
use tracing::info;

use gantry_tasks::{Task, TaskRegistry};

use super::load_project;
use crate::cli::{output, Cli, OutputFormat};

/// List available tasks
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Show each task's prerequisites and command
    #[arg(short, long)]
    pub long: bool,
}

impl ListCommand {
    /// Execute the list command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing list command");
        let project = load_project(cli)?;
        let registry = &project.registry;

        if cli.format == OutputFormat::Json {
            let output = serde_json::json!({
                "name": project.config.name,
                "config_path": project.config_path.to_string_lossy(),
                "default": registry.default_target(),
                "tasks": registry.tasks().map(|task| serde_json::json!({
                    "id": task.id(),
                    "namespace": task.id().namespace(),
                    "description": task.description(),
                    "prerequisites": task.prerequisites(),
                    "work": task.work().describe(),
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let title = project.config.name.as_deref().unwrap_or("Tasks");
        println!(
            "{} {}",
            output::header(title),
            style(format!("({})", project.config_path.display())).dim()
        );

        let width = registry
            .tasks()
            .map(|t| t.id().as_str().len())
            .max()
            .unwrap_or(0);

        for (namespace, tasks) in group_by_namespace(registry) {
            println!();
            if let Some(namespace) = namespace {
                println!("{}", output::header(&format!("{}:", namespace)));
            }
            for task in tasks {
                self.print_task(registry, task, width);
            }
        }

        if !cli.quiet {
            println!();
            println!(
                "{}",
                style(format!("{} in total", output::plural(registry.len(), "task"))).dim()
            );
        }
        Ok(())
    }

    fn print_task(&self, registry: &TaskRegistry, task: &Task, width: usize) {
        let is_default = registry.default_target() == Some(task.id());
        println!(
            "  {}{} {}{}",
            output::task_style().apply_to(task.id()),
            " ".repeat(width - task.id().as_str().len()),
            task.description().unwrap_or(""),
            if is_default {
                style(" (default)").green().to_string()
            } else {
                String::new()
            }
        );

        if self.long {
            if !task.prerequisites().is_empty() {
                let prerequisites: Vec<&str> =
                    task.prerequisites().iter().map(|p| p.as_str()).collect();
                println!(
                    "  {} depends on {}",
                    " ".repeat(width),
                    style(prerequisites.join(", ")).cyan()
                );
            }
            println!("  {} {}", " ".repeat(width), style(task.work().describe()).dim());
        }
    }
}

/// Bare tasks first, then each namespace in name order; tasks keep their
/// registration order within a group.
fn group_by_namespace(registry: &TaskRegistry) -> Vec<(Option<&str>, Vec<&Task>)> {
    let mut groups: Vec<(Option<&str>, Vec<&Task>)> = vec![(
        None,
        registry
            .tasks()
            .filter(|t| t.id().namespace().is_none())
            .collect(),
    )];

    for namespace in registry.namespaces() {
        groups.push((
            Some(namespace),
            registry
                .tasks()
                .filter(|t| t.id().namespace() == Some(namespace))
                .collect(),
        ));
    }

    groups.retain(|(_, tasks)| !tasks.is_empty());
    groups
}
