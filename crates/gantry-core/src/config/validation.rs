//! Configuration validation
//!
//! Checks the shape of the file only. Cross-task checks (unknown
//! prerequisites, cycles, the default target existing) belong to the task
//! registry, which sees the fully-qualified ids.

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::RESERVED_TASK_NAMES;
use super::types::{Config, TaskConfig};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");

    if let Some(ref default) = config.default {
        if default.trim().is_empty() {
            return Err(ConfigError::invalid("default", "default target cannot be empty").into());
        }
    }

    for (name, task) in &config.tasks {
        validate_name(&format!("tasks.{}", name), name)?;
        if RESERVED_TASK_NAMES.contains(&name.as_str()) {
            return Err(ConfigError::invalid(
                format!("tasks.{}", name),
                "name is reserved for a gantry subcommand; move the task into a namespace",
            )
            .into());
        }
        validate_task(&format!("tasks.{}", name), task)?;
    }

    for (namespace, tasks) in &config.namespaces {
        validate_name(&format!("namespaces.{}", namespace), namespace)?;
        for (name, task) in tasks {
            let field = format!("namespaces.{}.{}", namespace, name);
            validate_name(&field, name)?;
            validate_task(&field, task)?;
        }
    }

    debug!("configuration validation passed");
    Ok(())
}

fn validate_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConfigError::invalid(field, "name cannot be empty").into());
    }
    if name.contains('.') {
        return Err(ConfigError::invalid(field, "name cannot contain '.'").into());
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(field, "name cannot contain whitespace").into());
    }
    Ok(())
}

fn validate_task(field: &str, task: &TaskConfig) -> Result<()> {
    if task.body_count() > 1 {
        return Err(ConfigError::invalid(
            field,
            "only one of command, steps or remove may be set",
        )
        .into());
    }

    if task.command.is_none() && !task.args.is_empty() {
        return Err(ConfigError::invalid(format!("{}.args", field), "args require a command").into());
    }

    if let Some(ref command) = task.command {
        if command.trim().is_empty() {
            return Err(
                ConfigError::invalid(format!("{}.command", field), "command cannot be empty").into(),
            );
        }
    }

    for (i, step) in task.steps.iter().enumerate() {
        if step.command.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("{}.steps[{}].command", field, i),
                "step command cannot be empty",
            )
            .into());
        }
    }

    for dep in &task.depends_on {
        if dep.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("{}.depends_on", field),
                "dependency id cannot be empty",
            )
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::StepConfig;
    use crate::config::DEFAULT_CONFIG_TEMPLATE;
    use std::collections::BTreeMap;

    fn config_with_task(name: &str, task: TaskConfig) -> Config {
        let mut config = Config::default();
        config.tasks.insert(name.to_string(), task);
        config
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_template() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.task_count(), 12);
    }

    #[test]
    fn test_validate_empty_default() {
        let config = Config {
            default: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_dotted_name() {
        let config = config_with_task("build.frontend", TaskConfig::default());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_dotted_namespace() {
        let mut config = Config::default();
        let mut tasks = BTreeMap::new();
        tasks.insert("frontend".to_string(), TaskConfig::default());
        config.namespaces.insert("a.b".to_string(), tasks);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_reserved_name() {
        for name in RESERVED_TASK_NAMES {
            let err = validate_config(&config_with_task(name, TaskConfig::default())).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{err}");
        }
    }

    #[test]
    fn test_validate_reserved_name_inside_namespace() {
        let mut config = Config::default();
        let mut tasks = BTreeMap::new();
        tasks.insert("init".to_string(), TaskConfig::default());
        config.namespaces.insert("db".to_string(), tasks);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_multiple_bodies() {
        let task = TaskConfig {
            command: Some("yarn".to_string()),
            remove: vec!["dist".into()],
            ..Default::default()
        };
        assert!(validate_config(&config_with_task("clean", task)).is_err());
    }

    #[test]
    fn test_validate_args_without_command() {
        let task = TaskConfig {
            args: vec!["install".to_string()],
            ..Default::default()
        };
        assert!(validate_config(&config_with_task("deps", task)).is_err());
    }

    #[test]
    fn test_validate_empty_step_command() {
        let task = TaskConfig {
            steps: vec![StepConfig::default()],
            ..Default::default()
        };
        assert!(validate_config(&config_with_task("test", task)).is_err());
    }

    #[test]
    fn test_validate_aggregate_task() {
        let task = TaskConfig {
            depends_on: vec!["build.frontend".to_string()],
            ..Default::default()
        };
        assert!(validate_config(&config_with_task("buildAll", task)).is_ok());
    }
}
