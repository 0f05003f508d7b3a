//! Task errors

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::ActionError;
use crate::task::TaskId;

/// Errors raised while registering or executing tasks
#[derive(Debug, Error)]
pub enum TaskError {
    /// Two tasks registered under the same identifier
    #[error("Task '{0}' is already registered")]
    DuplicateTask(TaskId),

    /// Requested or referenced task does not exist
    #[error("Task '{0}' not found")]
    NotFound(TaskId),

    /// A task declares a prerequisite that was never registered
    #[error("Task '{task}' depends on unknown task '{prerequisite}'")]
    UnknownPrerequisite { task: TaskId, prerequisite: TaskId },

    /// A task is its own direct or transitive prerequisite
    #[error("Dependency cycle detected at task '{id}': {}", format_path(.path))]
    DependencyCycle { id: TaskId, path: Vec<TaskId> },

    /// Identifier is not of the form `name` or `namespace.name`
    #[error("Invalid task identifier '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// Nothing was requested and no default target is configured
    #[error("No target given and no default target configured")]
    NoDefaultTarget,

    /// A task's own work failed
    #[error("Task '{id}' failed: {source}")]
    Failed {
        id: TaskId,
        #[source]
        source: WorkError,
    },
}

impl TaskError {
    /// Identifier of the task the error is attributed to, if any
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::DuplicateTask(id) | Self::NotFound(id) => Some(id),
            Self::UnknownPrerequisite { task, .. } => Some(task),
            Self::DependencyCycle { id, .. } | Self::Failed { id, .. } => Some(id),
            Self::InvalidId { .. } | Self::NoDefaultTarget => None,
        }
    }

    /// Whether the error stems from the task graph rather than from running work
    pub fn is_config_error(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Errors returned by a task's own work
#[derive(Debug, Error)]
pub enum WorkError {
    /// External command failed or could not be launched
    #[error(transparent)]
    Action(#[from] ActionError),

    /// A path could not be removed
    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other failure reported by custom work
    #[error("{0}")]
    Other(String),
}

impl WorkError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

fn format_path(path: &[TaskId]) -> String {
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
