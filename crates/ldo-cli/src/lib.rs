//! LDO CLI library.
//!
//! This library provides the core functionality for the `ldo` command-line
//! interface: argument parsing, configuration loading, logging setup, command
//! execution and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{AppConfig, API_KEY_ENV};
pub use error::{CliError, Result};
pub use output::Formatter;

/// Exit status of a run that finished outside its completion policy
pub const EXIT_POLICY_VIOLATION: i32 = 2;
