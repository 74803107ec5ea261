//! CLI command handlers
//!
//! This module contains the command-line front end:
//! - Argument parsing structures
//! - Command implementations
//! - Logging setup

pub mod args;
pub mod commands;
pub mod help;
pub mod router;

pub use args::{Cli, Commands, DemoCommands};
pub use help::{get_log_level, init_tracing};
pub use router::execute_command;
