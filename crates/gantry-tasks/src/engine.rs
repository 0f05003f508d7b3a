//! Dependency execution engine
//!
//! Runs a request depth-first on the calling thread. Each task's
//! prerequisites run in declaration order before its own work, every task
//! runs at most once per request, and the first failure aborts whatever is
//! left of the request.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::error::TaskError;
use crate::registry::TaskRegistry;
use crate::reporter::{TaskEvent, TaskReporter, TracingReporter};
use crate::runner::ActionRunner;
use crate::task::{Task, TaskId};
use crate::work::WorkContext;

/// Per-request execution state.
///
/// `completed` holds tasks whose work succeeded during this request; a task
/// is only inserted after success. `in_progress` is the chain of tasks
/// currently being resolved and is what detects cycles.
#[derive(Debug, Default)]
pub(crate) struct ExecutionMemo {
    completed: HashSet<TaskId>,
    in_progress: Vec<TaskId>,
}

impl ExecutionMemo {
    fn new() -> Self {
        Self::default()
    }

    /// Whether `id` already completed in this request
    fn is_done(&self, id: &TaskId) -> bool {
        self.completed.contains(id)
    }

    fn enter(&mut self, id: &TaskId) -> Result<(), TaskError> {
        if let Some(start) = self.in_progress.iter().position(|p| p == id) {
            let mut path = self.in_progress[start..].to_vec();
            path.push(id.clone());
            return Err(TaskError::DependencyCycle {
                id: id.clone(),
                path,
            });
        }
        self.in_progress.push(id.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.in_progress.pop();
    }

    fn mark_done(&mut self, id: &TaskId) {
        self.completed.insert(id.clone());
    }
}

/// Outcome of a successful request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Tasks whose work ran, in execution order
    pub executed: Vec<TaskId>,
    /// Wall time of the whole request
    pub duration: Duration,
}

/// Executes requested tasks and their prerequisites
pub struct Engine<'a> {
    registry: &'a TaskRegistry,
    runner: &'a dyn ActionRunner,
    reporter: Arc<dyn TaskReporter>,
}

impl<'a> Engine<'a> {
    /// Create an engine reporting through tracing
    pub fn new(registry: &'a TaskRegistry, runner: &'a dyn ActionRunner) -> Self {
        Self {
            registry,
            runner,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Replace the reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn TaskReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the requested tasks in order with a fresh memo, stopping at the
    /// first failure. Later requested tasks are not attempted once one fails.
    #[instrument(skip_all, fields(requested = requested.len()))]
    pub fn execute(&self, requested: &[TaskId]) -> Result<ExecutionSummary, TaskError> {
        let start = Instant::now();
        let mut memo = ExecutionMemo::new();
        let mut executed = Vec::new();

        let result = requested.iter().try_for_each(|id| {
            self.execute_one(id, &mut memo, &mut |task: &Task| -> Result<(), TaskError> {
                self.run_work(task)?;
                executed.push(task.id().clone());
                Ok(())
            })
        });

        let duration = start.elapsed();
        self.reporter.report(&TaskEvent::Finished {
            executed: executed.len(),
            succeeded: result.is_ok(),
            duration,
        });

        result?;
        info!(executed = executed.len(), "request completed");
        Ok(ExecutionSummary { executed, duration })
    }

    /// The order `execute` would run tasks in, without running any work
    #[instrument(skip_all, fields(requested = requested.len()))]
    pub fn plan(&self, requested: &[TaskId]) -> Result<Vec<TaskId>, TaskError> {
        let mut memo = ExecutionMemo::new();
        let mut order = Vec::new();

        for id in requested {
            self.execute_one(id, &mut memo, &mut |task: &Task| -> Result<(), TaskError> {
                order.push(task.id().clone());
                Ok(())
            })?;
        }

        Ok(order)
    }

    /// Resolve one task: skip it if already done, otherwise run its
    /// prerequisites then hand it to `visit`. Only success is memoized.
    fn execute_one<F>(
        &self,
        id: &TaskId,
        memo: &mut ExecutionMemo,
        visit: &mut F,
    ) -> Result<(), TaskError>
    where
        F: FnMut(&Task) -> Result<(), TaskError>,
    {
        if memo.is_done(id) {
            self.reporter
                .report(&TaskEvent::Satisfied { id: id.clone() });
            return Ok(());
        }

        let task = self.registry.lookup(id)?;
        memo.enter(id)?;

        let result = self
            .execute_prerequisites(task, memo, visit)
            .and_then(|()| visit(task));

        memo.leave();
        result?;
        memo.mark_done(id);
        Ok(())
    }

    fn execute_prerequisites<F>(
        &self,
        task: &Task,
        memo: &mut ExecutionMemo,
        visit: &mut F,
    ) -> Result<(), TaskError>
    where
        F: FnMut(&Task) -> Result<(), TaskError>,
    {
        for prerequisite in task.prerequisites() {
            debug!(task = %task.id(), prerequisite = %prerequisite, "resolving prerequisite");
            self.execute_one(prerequisite, memo, visit)?;
        }
        Ok(())
    }

    fn run_work(&self, task: &Task) -> Result<(), TaskError> {
        let id = task.id();
        let work = task.work();
        self.reporter.report(&TaskEvent::Started {
            id: id.clone(),
            description: work.describe(),
        });

        let start = Instant::now();
        let ctx = WorkContext::new(id, self.runner);
        match work.run(&ctx) {
            Ok(()) => {
                self.reporter.report(&TaskEvent::Completed {
                    id: id.clone(),
                    duration: start.elapsed(),
                });
                Ok(())
            }
            Err(source) => {
                self.reporter.report(&TaskEvent::Failed {
                    id: id.clone(),
                    duration: start.elapsed(),
                    error: source.to_string(),
                });
                Err(TaskError::Failed {
                    id: id.clone(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkError;
    use crate::namespace::Namespace;
    use crate::reporter::CollectingReporter;
    use crate::runner::{Action, RecordingRunner};
    use crate::work::from_fn;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    /// Task whose work appends its id to `trace`, failing if `fail` is set
    fn traced(id: &str, trace: &Trace, fail: bool) -> Task {
        let trace = trace.clone();
        let name = id.to_string();
        Task::new(
            id,
            from_fn(format!("trace {}", id), move |_ctx| {
                trace.lock().unwrap().push(name.clone());
                if fail {
                    Err(WorkError::other(format!("{} failed", name)))
                } else {
                    Ok(())
                }
            }),
        )
    }

    fn ids(ids: &[&str]) -> Vec<TaskId> {
        ids.iter().map(|id| TaskId::new(*id)).collect()
    }

    fn trace_of(trace: &Trace) -> Vec<String> {
        trace.lock().unwrap().clone()
    }

    /// Deps, Build (after Deps) and Test (after Deps)
    fn deps_build_test(trace: &Trace, deps_fails: bool) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                traced("deps", trace, deps_fails),
                traced("build", trace, false).with_prerequisite("deps"),
                traced("test", trace, false).with_prerequisite("deps"),
            ])
            .unwrap();
        registry
    }

    #[test]
    fn test_shared_prerequisite_runs_once() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, false);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let summary = engine.execute(&ids(&["build", "test"])).unwrap();

        assert_eq!(trace_of(&trace), vec!["deps", "build", "test"]);
        assert_eq!(summary.executed, ids(&["deps", "build", "test"]));
    }

    #[test]
    fn test_failed_prerequisite_blocks_dependent() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, true);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let err = engine.execute(&ids(&["build"])).unwrap_err();

        assert!(matches!(err, TaskError::Failed { ref id, .. } if id.as_str() == "deps"));
        assert_eq!(trace_of(&trace), vec!["deps"]);
    }

    #[test]
    fn test_fail_fast_across_requested_targets() {
        let trace = Trace::default();
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                traced("lint", &trace, true),
                traced("format", &trace, false),
            ])
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let err = engine.execute(&ids(&["lint", "format"])).unwrap_err();

        assert_eq!(err.task_id(), Some(&TaskId::new("lint")));
        assert_eq!(trace_of(&trace), vec!["lint"]);
    }

    #[test]
    fn test_later_sibling_prerequisites_do_not_run_after_failure() {
        let trace = Trace::default();
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                traced("first", &trace, true),
                traced("second", &trace, false),
                traced("all", &trace, false).with_prerequisites(["first", "second"]),
            ])
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        assert!(engine.execute(&ids(&["all"])).is_err());
        assert_eq!(trace_of(&trace), vec!["first"]);
    }

    #[test]
    fn test_diamond_dependencies_deduplicated() {
        let trace = Trace::default();
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                traced("deps", &trace, false),
                traced("backend", &trace, false).with_prerequisite("deps"),
                traced("frontend", &trace, false).with_prerequisite("deps"),
                traced("bundle", &trace, false).with_prerequisites(["backend", "frontend"]),
                traced("all", &trace, false).with_prerequisites(["bundle", "deps", "frontend"]),
            ])
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        engine.execute(&ids(&["all", "bundle"])).unwrap();

        assert_eq!(
            trace_of(&trace),
            vec!["deps", "backend", "frontend", "bundle", "all"]
        );
    }

    #[test]
    fn test_unknown_target_runs_nothing() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, false);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let err = engine.execute(&ids(&["deploy"])).unwrap_err();

        assert!(matches!(err, TaskError::NotFound(ref id) if id.as_str() == "deploy"));
        assert!(trace_of(&trace).is_empty());
    }

    #[test]
    fn test_unknown_prerequisite_fails_before_work() {
        let trace = Trace::default();
        let mut registry = TaskRegistry::new();
        registry
            .register(traced("build", &trace, false).with_prerequisite("deps"))
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let err = engine.execute(&ids(&["build"])).unwrap_err();

        assert!(matches!(err, TaskError::NotFound(ref id) if id.as_str() == "deps"));
        assert!(trace_of(&trace).is_empty());
    }

    #[test]
    fn test_self_cycle_detected() {
        let trace = Trace::default();
        let mut registry = TaskRegistry::new();
        registry
            .register(traced("loop", &trace, false).with_prerequisite("loop"))
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let err = engine.execute(&ids(&["loop"])).unwrap_err();

        assert!(matches!(err, TaskError::DependencyCycle { ref id, .. } if id.as_str() == "loop"));
        assert!(trace_of(&trace).is_empty());
    }

    #[test]
    fn test_mutual_cycle_detected() {
        let trace = Trace::default();
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                traced("ping", &trace, false).with_prerequisite("pong"),
                traced("pong", &trace, false).with_prerequisite("ping"),
            ])
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        match engine.execute(&ids(&["ping"])).unwrap_err() {
            TaskError::DependencyCycle { id, path } => {
                assert_eq!(id.as_str(), "ping");
                assert_eq!(path, ids(&["ping", "pong", "ping"]));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failed_task_is_retried_by_a_new_request() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, true);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        assert!(engine.execute(&ids(&["build"])).is_err());
        assert!(engine.execute(&ids(&["test"])).is_err());

        assert_eq!(trace_of(&trace), vec!["deps", "deps"]);
    }

    #[test]
    fn test_each_request_gets_a_fresh_memo() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, false);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        engine.execute(&ids(&["build"])).unwrap();
        engine.execute(&ids(&["build"])).unwrap();

        assert_eq!(trace_of(&trace), vec!["deps", "build", "deps", "build"]);
    }

    #[test]
    fn test_duplicate_request_runs_once() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, false);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let summary = engine.execute(&ids(&["deps", "deps"])).unwrap();

        assert_eq!(summary.executed, ids(&["deps"]));
    }

    #[test]
    fn test_plan_matches_execution_order() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, false);
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let plan = engine.plan(&ids(&["test", "build"])).unwrap();

        assert_eq!(plan, ids(&["deps", "test", "build"]));
        assert!(trace_of(&trace).is_empty());
    }

    #[test]
    fn test_plan_detects_cycles() {
        let mut registry = TaskRegistry::new();
        registry
            .register(Task::aggregate("loop").with_prerequisite("loop"))
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        assert!(matches!(
            engine.plan(&ids(&["loop"])),
            Err(TaskError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn test_actions_run_through_runner() {
        let build = Namespace::new("build");
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                Task::new("deps", Action::new("yarn").with_arg("install")),
                build
                    .task(
                        "backendLinux",
                        Action::new("go")
                            .with_args(["build", "./pkg"])
                            .with_env("GOOS", "linux"),
                    ),
                build
                    .task("frontend", Action::new("yarn").with_arg("build"))
                    .with_prerequisite("deps"),
                Task::aggregate("buildAll")
                    .with_prerequisites([build.id("backendLinux"), build.id("frontend")]),
            ])
            .unwrap();
        let runner = RecordingRunner::new();
        let engine = Engine::new(&registry, &runner);

        let summary = engine.execute(&ids(&["buildAll"])).unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["go build ./pkg", "yarn install", "yarn build"]
        );
        assert_eq!(runner.actions()[0].env.get("GOOS").map(String::as_str), Some("linux"));
        assert_eq!(summary.executed.len(), 4);
    }

    #[test]
    fn test_action_failure_attributed_to_owning_task() {
        let mut registry = TaskRegistry::new();
        registry
            .register_all([
                Task::new("lint", Action::new("golangci-lint").with_args(["run", "./..."])),
                Task::aggregate("check").with_prerequisite("lint"),
            ])
            .unwrap();
        let runner = RecordingRunner::new().fail_program("golangci-lint", 1);
        let engine = Engine::new(&registry, &runner);

        let err = engine.execute(&ids(&["check"])).unwrap_err();

        match err {
            TaskError::Failed { id, source } => {
                assert_eq!(id.as_str(), "lint");
                assert!(matches!(source, WorkError::Action(ref e) if e.exit_code() == Some(1)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reporter_events() {
        let trace = Trace::default();
        let registry = deps_build_test(&trace, false);
        let runner = RecordingRunner::new();
        let reporter = Arc::new(CollectingReporter::default());
        let engine = Engine::new(&registry, &runner).with_reporter(reporter.clone());

        engine.execute(&ids(&["build", "test"])).unwrap();

        assert_eq!(reporter.started(), ids(&["deps", "build", "test"]));
        let events = reporter.events();
        assert!(events.contains(&TaskEvent::Satisfied {
            id: TaskId::new("deps")
        }));
        assert!(matches!(
            events.last(),
            Some(TaskEvent::Finished {
                executed: 3,
                succeeded: true,
                ..
            })
        ));
    }
}
