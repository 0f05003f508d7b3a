//! Exit codes for the CLI

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Configuration error: missing or invalid config, unknown target, cycle
pub const CONFIG_ERROR: u8 = 2;

/// A task's work failed
pub const TASK_FAILED: u8 = 3;
