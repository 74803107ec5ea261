//! CLI argument structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run processes and stream their output line by line
#[derive(Parser)]
#[command(name = "procstream")]
#[command(about = "procstream - Run processes and stream their output line by line", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command and stream its stdout and stderr as they are written
    Run {
        /// Tag identifying the process (defaults to the configured default tag)
        #[arg(short, long)]
        tag: Option<String>,

        /// Template for stdout lines, containing exactly one `{}`
        #[arg(long, value_name = "TEMPLATE")]
        stdout_format: Option<String>,

        /// Template for stderr lines, containing exactly one `{}`
        #[arg(long, value_name = "TEMPLATE")]
        stderr_format: Option<String>,

        /// Command line to run; a single argument is split shell-style
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Run one of the built-in demonstrations
    Demo {
        #[command(subcommand)]
        demo: DemoCommands,
    },
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoCommands {
    /// A single process writing to both streams and exiting with 1
    Simple,
    /// A process whose stderr "trigger" line launches a longer-lived second process
    Chained,
}
