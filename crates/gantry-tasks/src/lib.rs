//! Gantry Tasks - Task dependency execution engine
//!
//! This crate provides the task registry, namespaced task identifiers, the
//! work units tasks perform, the external action runner, and the engine that
//! runs a request depth-first, executing every task at most once and stopping
//! at the first failure.

pub mod engine;
pub mod error;
pub mod namespace;
pub mod pipeline;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod task;
pub mod work;

pub use engine::{Engine, ExecutionSummary};
pub use error::{TaskError, WorkError};
pub use namespace::Namespace;
pub use pipeline::build_registry;
pub use registry::TaskRegistry;
pub use reporter::{CollectingReporter, TaskEvent, TaskReporter, TracingReporter};
pub use runner::{Action, ActionError, ActionRunner, ProcessRunner, RecordingRunner};
pub use task::{Task, TaskId};
pub use work::{from_fn, NoOp, RemovePaths, Steps, Work, WorkContext};
