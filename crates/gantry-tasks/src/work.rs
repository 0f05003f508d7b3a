//! Work units performed by tasks

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use crate::error::WorkError;
use crate::runner::{Action, ActionRunner};
use crate::task::TaskId;

/// What a piece of work can reach while it runs
pub struct WorkContext<'a> {
    task: &'a TaskId,
    runner: &'a dyn ActionRunner,
}

impl<'a> WorkContext<'a> {
    pub fn new(task: &'a TaskId, runner: &'a dyn ActionRunner) -> Self {
        Self { task, runner }
    }

    /// The task this work belongs to
    pub fn task(&self) -> &TaskId {
        self.task
    }

    pub fn runner(&self) -> &dyn ActionRunner {
        self.runner
    }

    /// Run an external action through the configured runner
    pub fn run_action(&self, action: &Action) -> Result<(), WorkError> {
        debug!(task = %self.task, command = %action, "running action");
        self.runner.run(action).map_err(WorkError::from)
    }
}

/// A task's own unit of work, run after its prerequisites succeed
pub trait Work: Send + Sync {
    /// Perform the work
    fn run(&self, ctx: &WorkContext<'_>) -> Result<(), WorkError>;

    /// Short human-readable summary, e.g. the command line
    fn describe(&self) -> String;
}

impl Work for Action {
    fn run(&self, ctx: &WorkContext<'_>) -> Result<(), WorkError> {
        ctx.run_action(self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

/// Several actions run in order; the first failure stops the rest
#[derive(Debug, Clone, Default)]
pub struct Steps {
    actions: Vec<Action>,
}

impl Steps {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl Work for Steps {
    fn run(&self, ctx: &WorkContext<'_>) -> Result<(), WorkError> {
        for action in &self.actions {
            ctx.run_action(action)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.actions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// Recursively deletes files and directories. Missing paths are skipped.
#[derive(Debug, Clone, Default)]
pub struct RemovePaths {
    paths: Vec<PathBuf>,
}

impl RemovePaths {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Work for RemovePaths {
    fn run(&self, ctx: &WorkContext<'_>) -> Result<(), WorkError> {
        for path in &self.paths {
            let remove_error = |source| WorkError::Remove {
                path: path.clone(),
                source,
            };

            let metadata = match std::fs::symlink_metadata(path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(task = %ctx.task(), path = %path.display(), "nothing to remove");
                    continue;
                }
                Err(e) => return Err(remove_error(e)),
            };

            debug!(task = %ctx.task(), path = %path.display(), "removing");
            if metadata.is_dir() {
                std::fs::remove_dir_all(path).map_err(remove_error)?;
            } else {
                std::fs::remove_file(path).map_err(remove_error)?;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let paths: Vec<String> = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        format!("remove {}", paths.join(" "))
    }
}

/// Work that does nothing; the task exists to group its prerequisites
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl Work for NoOp {
    fn run(&self, _ctx: &WorkContext<'_>) -> Result<(), WorkError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "(prerequisites only)".to_string()
    }
}

/// Work backed by a closure, see [`from_fn`]
pub struct FnWork<F> {
    description: String,
    f: F,
}

impl<F> fmt::Debug for FnWork<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnWork")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> Work for FnWork<F>
where
    F: Fn(&WorkContext<'_>) -> Result<(), WorkError> + Send + Sync,
{
    fn run(&self, ctx: &WorkContext<'_>) -> Result<(), WorkError> {
        (self.f)(ctx)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Wrap a closure as work
pub fn from_fn<F>(description: impl Into<String>, f: F) -> FnWork<F>
where
    F: Fn(&WorkContext<'_>) -> Result<(), WorkError> + Send + Sync,
{
    FnWork {
        description: description.into(),
        f,
    }
}
