//! Gantry Core - Core library for the build-task orchestrator
//!
//! This crate provides the error types and the build configuration model
//! (loading, validation and the starter template) shared by the task engine
//! and the command-line front-end.

pub mod config;
pub mod error;

pub use config::{Config, StepConfig, TaskConfig};
pub use error::{ConfigError, GantryError, Result};
