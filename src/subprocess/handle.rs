use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout};

use super::command::ProcessCommand;
use super::error::ProcessError;

/// Exclusive ownership of one spawned OS process and its output pipes.
///
/// The two pipes are taken out independently so that each can be drained by
/// its own reader while the handle keeps the child for the exit-status wait.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl ProcessHandle {
    /// Start `command` with piped stdout and stderr.
    pub fn spawn(command: &ProcessCommand) -> Result<Self, ProcessError> {
        Self::log_command_start(command);

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, command))?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Ok(Self {
            child,
            pid,
            stdout,
            stderr,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn take_stdout(&mut self) -> Result<ChildStdout, ProcessError> {
        self.stdout.take().ok_or(ProcessError::MissingPipe("stdout"))
    }

    pub fn take_stderr(&mut self) -> Result<ChildStderr, ProcessError> {
        self.stderr.take().ok_or(ProcessError::MissingPipe("stderr"))
    }

    /// Wait for the process to exit and return its status code.
    pub async fn wait(&mut self) -> Result<i32, ProcessError> {
        let status = self.child.wait().await?;
        Ok(exit_code(status))
    }

    /// The exit code the OS reports for the child, if it has already exited.
    pub fn reported_status(&mut self) -> Result<Option<i32>, ProcessError> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!("Executing subprocess: {}", command.command_line());

        if !command.env.is_empty() {
            tracing::trace!("Environment variables: {:?}", command.env);
        }
        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }
    }

    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        tracing::error!(
            "Failed to spawn '{}': {:?} (kind: {:?})",
            command.program,
            error,
            error.kind()
        );

        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.command_line(),
                source: error,
            }
        }
    }
}

/// Collapse an exit status into a single integer.
///
/// Normal exits yield their code; on Unix a signal-terminated process yields
/// the negated signal number.
pub fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        code
    } else {
        signal_code(status)
    }
}

#[cfg(unix)]
fn signal_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| -signal).unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_code(_status: std::process::ExitStatus) -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommandBuilder;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_spawn_and_wait_reports_exit_code() {
        let command = ProcessCommandBuilder::new("sh")
            .arg("-c")
            .arg("exit 7")
            .build();

        let mut handle = ProcessHandle::spawn(&command).unwrap();
        assert!(handle.pid().is_some());
        assert_eq!(handle.wait().await.unwrap(), 7);
        assert_eq!(handle.reported_status().unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_pipes_can_only_be_taken_once() {
        let command = ProcessCommand::parse("echo piped").unwrap();
        let mut handle = ProcessHandle::spawn(&command).unwrap();

        let mut stdout = handle.take_stdout().unwrap();
        let mut text = String::new();
        stdout.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "piped\n");

        assert!(matches!(
            handle.take_stdout(),
            Err(ProcessError::MissingPipe("stdout"))
        ));
        assert!(handle.take_stderr().is_ok());
        assert_eq!(handle.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawn_nonexistent_program() {
        let command = ProcessCommand::parse("nonexistent_command_12345 --flag").unwrap();
        let err = ProcessHandle::spawn(&command).unwrap_err();
        assert!(matches!(err, ProcessError::CommandNotFound(ref p) if p == "nonexistent_command_12345"));
        assert!(err.is_spawn_error());
    }

    #[tokio::test]
    async fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let command = ProcessCommandBuilder::new("pwd")
            .current_dir(dir.path())
            .build();

        let mut handle = ProcessHandle::spawn(&command).unwrap();
        let mut stdout = handle.take_stdout().unwrap();
        let mut text = String::new();
        stdout.read_to_string(&mut text).await.unwrap();
        handle.wait().await.unwrap();

        let expected = dir.path().canonicalize().unwrap();
        let reported = std::path::PathBuf::from(text.trim()).canonicalize().unwrap();
        assert_eq!(reported, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_conversion() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(exit_code(std::process::ExitStatus::from_raw(0)), 0);
        // Exit code 1 is encoded in the high byte of the wait status
        assert_eq!(exit_code(std::process::ExitStatus::from_raw(256)), 1);
        // SIGKILL
        assert_eq!(exit_code(std::process::ExitStatus::from_raw(9)), -9);
    }
}
