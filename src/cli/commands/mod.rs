//! CLI command implementations

pub mod demo;
pub mod run;

pub use demo::run_demo;
pub use run::{command_line_from_args, run_command, RunParams};
