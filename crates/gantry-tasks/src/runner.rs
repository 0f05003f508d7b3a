//! External action runner
//!
//! An [`Action`] is one external command: program, arguments, an environment
//! overlay merged on top of the inherited environment, and whether its output
//! is streamed to the terminal. [`ProcessRunner`] spawns it and blocks until it
//! exits.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, instrument};

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Executable name or path
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Environment overrides; everything else is inherited
    pub env: BTreeMap<String, String>,
    /// Whether stdout/stderr are streamed (otherwise discarded)
    pub stream: bool,
    /// Directory to run in (defaults to the current directory)
    pub working_dir: Option<PathBuf>,
}

impl Action {
    /// Create an action for `program` with no arguments, streaming its output
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            stream: true,
            working_dir: None,
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Override several environment variables; later entries win
    pub fn with_envs<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in vars {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }

    /// Set whether output is streamed
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Errors from running an external action
#[derive(Debug, Error)]
pub enum ActionError {
    /// The executable could not be resolved
    #[error("Executable '{program}' not found: {source}")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    /// The process could not be spawned or waited on
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a nonzero status
    #[error("Command '{command}' exited with code {code}")]
    ExitStatus { command: String, code: i32 },

    /// The process was killed before exiting
    #[error("Command '{command}' was terminated by a signal")]
    Terminated { command: String },
}

impl ActionError {
    /// Exit code of the failed process, if it exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Runs external actions on behalf of tasks
pub trait ActionRunner: Send + Sync {
    /// Run the action to completion; success iff it exits with status zero
    fn run(&self, action: &Action) -> Result<(), ActionError>;
}

/// Runner that spawns real processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    force_stream: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream output of every action, regardless of its own setting
    pub fn with_force_stream(mut self, force: bool) -> Self {
        self.force_stream = force;
        self
    }

    /// Resolve the executable the way the child would see it: the overlay's
    /// `PATH` if set, relative paths against the action's working directory.
    fn resolve(&self, action: &Action) -> Result<PathBuf, ActionError> {
        let launch_error = |source| ActionError::Launch {
            program: action.program.clone(),
            source,
        };

        let cwd = std::env::current_dir().map_err(launch_error)?;
        let dir = match action.working_dir {
            Some(ref dir) => absolute(&cwd, dir),
            None => cwd,
        };
        let search_path = action
            .env
            .get("PATH")
            .map(OsString::from)
            .or_else(|| std::env::var_os("PATH"));

        which::which_in(&action.program, search_path, &dir).map_err(|source| {
            ActionError::NotFound {
                program: action.program.clone(),
                source,
            }
        })
    }
}

impl ActionRunner for ProcessRunner {
    #[instrument(skip_all, fields(command = %action))]
    fn run(&self, action: &Action) -> Result<(), ActionError> {
        let executable = self.resolve(action)?;
        let stream = self.force_stream || action.stream;

        let mut command = Command::new(&executable);
        command.args(&action.args).envs(&action.env);

        if let Some(ref dir) = action.working_dir {
            command.current_dir(dir);
        }

        if stream {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        debug!(
            executable = %executable.display(),
            overlay = action.env.len(),
            stream,
            "spawning process"
        );

        let status = command.status().map_err(|source| ActionError::Launch {
            program: action.program.clone(),
            source,
        })?;

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(ActionError::ExitStatus {
                command: action.to_string(),
                code,
            }),
            None => Err(ActionError::Terminated {
                command: action.to_string(),
            }),
        }
    }
}

fn absolute(cwd: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        cwd.join(dir)
    }
}

/// Runner that records actions instead of spawning them.
///
/// Programs registered with [`RecordingRunner::fail_program`] fail with the
/// given exit code; everything else succeeds.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    actions: Mutex<Vec<Action>>,
    failures: HashMap<String, i32>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every action running `program` exit with `code`
    pub fn fail_program(mut self, program: impl Into<String>, code: i32) -> Self {
        self.failures.insert(program.into(), code);
        self
    }

    /// All actions seen so far, in order
    pub fn actions(&self) -> Vec<Action> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Command lines of all actions seen so far
    pub fn command_lines(&self) -> Vec<String> {
        self.actions().iter().map(ToString::to_string).collect()
    }
}

impl ActionRunner for RecordingRunner {
    fn run(&self, action: &Action) -> Result<(), ActionError> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action.clone());

        match self.failures.get(&action.program) {
            Some(&code) => Err(ActionError::ExitStatus {
                command: action.to_string(),
                code,
            }),
            None => Ok(()),
        }
    }
}
