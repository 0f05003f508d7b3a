//! Task execution reporting

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::task::TaskId;

/// Events emitted during task execution
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A task's own work is starting
    Started { id: TaskId, description: String },
    /// A task was requested again after it already completed in this run
    Satisfied { id: TaskId },
    /// A task's work completed successfully
    Completed { id: TaskId, duration: Duration },
    /// A task's work failed
    Failed {
        id: TaskId,
        duration: Duration,
        error: String,
    },
    /// The whole request finished
    Finished {
        executed: usize,
        succeeded: bool,
        duration: Duration,
    },
}

/// Trait for reporting task execution progress
pub trait TaskReporter: Send + Sync {
    /// Handle a task event
    fn report(&self, event: &TaskEvent);
}

/// Simple reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { id, description } => {
                tracing::info!("Running {}: {}", id, description);
            }
            TaskEvent::Satisfied { id } => {
                tracing::debug!("{} already done in this run", id);
            }
            TaskEvent::Completed { id, duration } => {
                tracing::info!("{} completed in {:.1}s", id, duration.as_secs_f64());
            }
            TaskEvent::Failed {
                id,
                duration,
                error,
            } => {
                tracing::error!("{} failed after {:.1}s: {}", id, duration.as_secs_f64(), error);
            }
            TaskEvent::Finished {
                executed,
                succeeded,
                duration,
            } => {
                if *succeeded {
                    tracing::info!(
                        "Run complete: {} tasks executed ({:.1}s)",
                        executed,
                        duration.as_secs_f64()
                    );
                } else {
                    tracing::warn!(
                        "Run aborted after {} tasks ({:.1}s)",
                        executed,
                        duration.as_secs_f64()
                    );
                }
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// IDs of tasks whose work started, in order
    pub fn started(&self) -> Vec<TaskId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TaskEvent::Started { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::default();
        let id = TaskId::new("deps");

        reporter.report(&TaskEvent::Started {
            id: id.clone(),
            description: "yarn install".to_string(),
        });
        reporter.report(&TaskEvent::Completed {
            id: id.clone(),
            duration: Duration::from_secs(5),
        });

        assert_eq!(reporter.events().len(), 2);
        assert_eq!(reporter.started(), vec![id]);
    }

    #[test]
    fn test_tracing_reporter() {
        let reporter = TracingReporter;
        let id = TaskId::new("build.frontend");

        // Just verify it doesn't panic
        reporter.report(&TaskEvent::Started {
            id: id.clone(),
            description: "grafana-toolkit plugin:build".to_string(),
        });
        reporter.report(&TaskEvent::Failed {
            id,
            duration: Duration::from_secs(1),
            error: "exited with code 1".to_string(),
        });
        reporter.report(&TaskEvent::Finished {
            executed: 1,
            succeeded: false,
            duration: Duration::from_secs(1),
        });
    }
}
