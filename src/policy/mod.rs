//! Output policies: what happens to each line a supervised process writes
//!
//! A policy is invoked synchronously from the stream pump, once per line.
//! Every callback receives the [`Supervisor`] that owns the process, so a
//! policy may launch further processes with [`Supervisor::run`]; inside a run
//! that call schedules the new process onto the current concurrency domain
//! and returns immediately.

pub mod capture;
pub mod chain;
pub mod format;

pub use capture::CaptureSink;
pub use chain::{ChainRule, ChainingPolicy};
pub use format::{decode_line, FormatError, FormattingPolicy, OutputSpec};

use crate::supervisor::Supervisor;

/// Per-stream line consumers plus optional lifecycle hooks.
///
/// Returning an error from a line callback aborts the pump of that process
/// and fails its launch; it is never swallowed.
pub trait OutputPolicy: Send + Sync {
    fn on_stdout_line(&self, supervisor: &Supervisor, tag: &str, line: &[u8])
        -> anyhow::Result<()>;

    fn on_stderr_line(&self, supervisor: &Supervisor, tag: &str, line: &[u8])
        -> anyhow::Result<()>;

    fn on_process_started(&self, supervisor: &Supervisor, tag: &str) {
        tracing::info!(
            "Process '{}' created with pid {}.",
            tag,
            display_pid(supervisor.pid(tag))
        );
    }

    fn on_process_ended(&self, supervisor: &Supervisor, tag: &str) {
        let status = supervisor
            .status(tag)
            .map_or_else(|| "unknown".to_string(), |s| s.to_string());
        tracing::info!(
            "Process '{}' pid {} exited with status {}.",
            tag,
            display_pid(supervisor.pid(tag)),
            status
        );
    }
}

fn display_pid(pid: Option<u32>) -> String {
    pid.map_or_else(|| "?".to_string(), |p| p.to_string())
}

/// Discards every line. Useful when only lifecycle and status matter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPolicy;

impl OutputPolicy for NullPolicy {
    fn on_stdout_line(&self, _: &Supervisor, _: &str, _: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_stderr_line(&self, _: &Supervisor, _: &str, _: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }
}
