//! Task registry
//!
//! Built once at startup and read-only afterwards; the engine borrows it.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument};

use crate::error::TaskError;
use crate::task::{Task, TaskId};

/// All tasks known to one invocation, keyed by identifier
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, Task>,
    /// Registration order, for listing and validation
    order: Vec<TaskId>,
    default: Option<TaskId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task; its identifier must not already be registered
    pub fn register(&mut self, task: Task) -> Result<(), TaskError> {
        let id = task.id().clone();
        id.validate()?;
        if self.tasks.contains_key(&id) {
            return Err(TaskError::DuplicateTask(id));
        }

        debug!(task = %id, prerequisites = task.prerequisites().len(), "registered task");
        self.order.push(id.clone());
        self.tasks.insert(id, task);
        Ok(())
    }

    /// Register several tasks, stopping at the first duplicate
    pub fn register_all(&mut self, tasks: impl IntoIterator<Item = Task>) -> Result<(), TaskError> {
        tasks.into_iter().try_for_each(|task| self.register(task))
    }

    /// Find a task by identifier
    pub fn lookup(&self, id: &TaskId) -> Result<&Task, TaskError> {
        self.tasks
            .get(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Set the target run when none is requested
    pub fn set_default(&mut self, id: impl Into<TaskId>) {
        self.default = Some(id.into());
    }

    pub fn default_target(&self) -> Option<&TaskId> {
        self.default.as_ref()
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    /// Names of all namespaces in use, sorted
    pub fn namespaces(&self) -> BTreeSet<&str> {
        self.order.iter().filter_map(TaskId::namespace).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check the graph before anything runs: the default target and every
    /// prerequisite must exist, and no task may depend on itself.
    #[instrument(skip_all, fields(tasks = self.tasks.len()))]
    pub fn validate(&self) -> Result<(), TaskError> {
        if let Some(ref default) = self.default {
            self.lookup(default)?;
        }

        for task in self.tasks() {
            for prerequisite in task.prerequisites() {
                if !self.contains(prerequisite) {
                    return Err(TaskError::UnknownPrerequisite {
                        task: task.id().clone(),
                        prerequisite: prerequisite.clone(),
                    });
                }
            }
        }

        let mut visits: HashMap<&TaskId, Visit> = HashMap::new();
        let mut stack: Vec<&TaskId> = Vec::new();
        for id in &self.order {
            self.check_cycles(id, &mut visits, &mut stack)?;
        }

        debug!("task graph validated");
        Ok(())
    }

    fn check_cycles<'a>(
        &'a self,
        id: &'a TaskId,
        visits: &mut HashMap<&'a TaskId, Visit>,
        stack: &mut Vec<&'a TaskId>,
    ) -> Result<(), TaskError> {
        match visits.get(id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = stack.iter().position(|s| *s == id).unwrap_or(0);
                let mut path: Vec<TaskId> = stack[start..].iter().map(|s| (*s).clone()).collect();
                path.push(id.clone());
                return Err(TaskError::DependencyCycle {
                    id: id.clone(),
                    path,
                });
            }
            None => {}
        }

        visits.insert(id, Visit::InProgress);
        stack.push(id);

        let task = self.lookup(id)?;
        for prerequisite in task.prerequisites() {
            self.check_cycles(prerequisite, visits, stack)?;
        }

        stack.pop();
        visits.insert(id, Visit::Done);
        Ok(())
    }
}
