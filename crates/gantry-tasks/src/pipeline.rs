//! Build a task registry from configuration

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, instrument};

use gantry_core::config::{Config, TaskBody, TaskConfig};

use crate::error::TaskError;
use crate::namespace::Namespace;
use crate::registry::TaskRegistry;
use crate::runner::Action;
use crate::task::{Task, TaskId};
use crate::work::{RemovePaths, Steps};

/// Register every configured task, set the default target and validate the
/// resulting graph. Commands run in `root` and `remove` paths resolve
/// against it.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn build_registry(config: &Config, root: &Path) -> Result<TaskRegistry, TaskError> {
    let mut registry = TaskRegistry::new();

    for (name, task_config) in &config.tasks {
        let id = TaskId::parse(name)?;
        registry.register(build_task(id, task_config, config, root)?)?;
    }

    for (namespace, tasks) in &config.namespaces {
        let namespace = Namespace::new(namespace);
        for (name, task_config) in tasks {
            let id = namespace.id(name);
            registry.register(build_task(id, task_config, config, root)?)?;
        }
    }

    if let Some(ref default) = config.default {
        registry.set_default(TaskId::parse(default)?);
    }

    registry.validate()?;
    info!(
        tasks = registry.len(),
        namespaces = registry.namespaces().len(),
        "task registry built"
    );
    Ok(registry)
}

fn build_task(
    id: TaskId,
    task_config: &TaskConfig,
    config: &Config,
    root: &Path,
) -> Result<Task, TaskError> {
    let prerequisites = task_config
        .depends_on
        .iter()
        .map(|dep| TaskId::parse(dep))
        .collect::<Result<Vec<_>, _>>()?;

    let action = |command: &str, args: &[String], env: &[&BTreeMap<String, String>]| {
        env.iter()
            .fold(Action::new(command).with_args(args.iter().cloned()), |action, vars| {
                action.with_envs(vars.iter())
            })
            .with_stream(task_config.stream)
            .with_working_dir(root)
    };

    let task = match task_config.body() {
        TaskBody::Command(command) => Task::new(
            id,
            action(command, &task_config.args, &[&config.env, &task_config.env]),
        ),
        TaskBody::Steps(steps) => Task::new(
            id,
            Steps::new(
                steps
                    .iter()
                    .map(|step| {
                        action(
                            &step.command,
                            &step.args,
                            &[&config.env, &task_config.env, &step.env],
                        )
                    })
                    .collect(),
            ),
        ),
        TaskBody::Remove(paths) => Task::new(id, RemovePaths::new(paths.iter().map(|p| root.join(p)))),
        TaskBody::Aggregate => Task::aggregate(id),
    };

    let task = match task_config.description {
        Some(ref description) => task.with_description(description),
        None => task,
    };
    Ok(task.with_prerequisites(prerequisites))
}
