//! # procstream
//!
//! Launch child processes, stream their stdout and stderr line by line into
//! pluggable output policies while they run, and wait for every process they
//! transitively led to, including processes launched from inside an output
//! callback that outlive the process that triggered them.
//!
//! ```no_run
//! use procstream::policy::{FormattingPolicy, OutputSpec};
//! use procstream::Supervisor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let policy = FormattingPolicy::new(OutputSpec::stdout("OUT: {}")?, OutputSpec::stderr("ERR: {}")?);
//! let supervisor = Supervisor::new(policy);
//! let status = supervisor.run("printf 'a\\nb\\n'", "t")?;
//! assert_eq!(status, Some(0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `subprocess` - Command tokenizing, process handles, line readers and the stream pump
//! - `supervisor` - Registry of tagged processes and the run-to-completion entry point
//! - `policy` - The `OutputPolicy` trait plus formatting and chaining policies
//! - `config` - TOML and environment configuration for the command-line front end
//! - `cli` - Argument parsing and command implementations of the `procstream` binary
pub mod cli;
pub mod config;
pub mod error;
pub mod policy;
pub mod subprocess;
pub mod supervisor;

pub use error::SupervisorError;
pub use policy::OutputPolicy;
pub use supervisor::Supervisor;
