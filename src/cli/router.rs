//! Command routing and execution

use crate::cli::args::Commands;
use crate::cli::commands::{run_command, run_demo, RunParams};
use crate::config::Config;
use anyhow::Result;

/// Execute a CLI command and return the status of its main process
pub fn execute_command(command: Commands, config: &Config) -> Result<i32> {
    match command {
        Commands::Run {
            tag,
            stdout_format,
            stderr_format,
            command,
        } => run_command(
            config,
            RunParams {
                tag,
                stdout_format,
                stderr_format,
                command,
            },
        ),
        Commands::Demo { demo } => run_demo(demo),
    }
}
