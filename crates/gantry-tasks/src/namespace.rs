//! Task namespaces
//!
//! A namespace only qualifies identifiers: tasks `a` and `b` registered
//! through namespace `ns` get the ids `ns.a` and `ns.b`.

use crate::task::{Task, TaskId};
use crate::work::Work;

/// A naming prefix for a group of related tasks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified ID of `task` within this namespace
    pub fn id(&self, task: &str) -> TaskId {
        TaskId::qualified(&self.name, task)
    }

    /// Create a task whose ID is qualified by this namespace
    pub fn task(&self, name: &str, work: impl Work + 'static) -> Task {
        Task::new(self.id(name), work)
    }

    /// Whether `id` belongs to this namespace
    pub fn contains(&self, id: &TaskId) -> bool {
        id.namespace() == Some(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work::NoOp;

    #[test]
    fn test_namespace_qualifies_ids() {
        let build = Namespace::new("build");
        assert_eq!(build.id("frontend"), TaskId::new("build.frontend"));

        let task = build.task("backendLinux", NoOp);
        assert_eq!(task.id().as_str(), "build.backendLinux");
        assert!(build.contains(task.id()));
    }

    #[test]
    fn test_namespace_does_not_contain_bare_ids() {
        let build = Namespace::new("build");
        assert!(!build.contains(&TaskId::new("deps")));
        assert!(!build.contains(&TaskId::new("builder.frontend")));
    }
}
