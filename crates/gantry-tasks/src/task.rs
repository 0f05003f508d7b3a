//! Task types and definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::work::{NoOp, Work};

/// Unique identifier for a task: `name` or `namespace.name`
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Separator between namespace and task name
    pub const SEPARATOR: char = '.';

    /// Create a task ID without validating it
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a namespace-qualified task ID
    pub fn qualified(namespace: &str, name: &str) -> Self {
        Self(format!("{}{}{}", namespace, Self::SEPARATOR, name))
    }

    /// Parse and validate a task ID
    pub fn parse(s: &str) -> Result<Self, TaskError> {
        let id = Self::new(s);
        id.validate()?;
        Ok(id)
    }

    /// Check the ID is a non-empty name with at most one namespace segment
    pub fn validate(&self) -> Result<(), TaskError> {
        let invalid = |reason: &str| TaskError::InvalidId {
            id: self.0.clone(),
            reason: reason.to_string(),
        };

        if self.0.is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if self.0.chars().any(char::is_whitespace) {
            return Err(invalid("identifier contains whitespace"));
        }
        if self.0.split(Self::SEPARATOR).any(str::is_empty) {
            return Err(invalid("namespace and name must both be non-empty"));
        }
        if self.0.matches(Self::SEPARATOR).count() > 1 {
            return Err(invalid("namespaces cannot be nested"));
        }
        Ok(())
    }

    /// The full identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part, if the ID is qualified
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(Self::SEPARATOR).map(|(ns, _)| ns)
    }

    /// Task name without its namespace
    pub fn name(&self) -> &str {
        self.0
            .split_once(Self::SEPARATOR)
            .map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A registered unit of build work with its prerequisites
pub struct Task {
    id: TaskId,
    description: Option<String>,
    prerequisites: Vec<TaskId>,
    work: Box<dyn Work>,
}

impl Task {
    /// Create a task performing `work`
    pub fn new(id: impl Into<TaskId>, work: impl Work + 'static) -> Self {
        Self {
            id: id.into(),
            description: None,
            prerequisites: Vec::new(),
            work: Box::new(work),
        }
    }

    /// Create a task that only groups its prerequisites
    pub fn aggregate(id: impl Into<TaskId>) -> Self {
        Self::new(id, NoOp)
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a prerequisite; prerequisites run in the order they are added
    pub fn with_prerequisite(mut self, id: impl Into<TaskId>) -> Self {
        self.prerequisites.push(id.into());
        self
    }

    /// Add several prerequisites
    pub fn with_prerequisites<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.prerequisites.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn prerequisites(&self) -> &[TaskId] {
        &self.prerequisites
    }

    pub fn work(&self) -> &dyn Work {
        self.work.as_ref()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("prerequisites", &self.prerequisites)
            .field("work", &self.work.describe())
            .finish()
    }
}
