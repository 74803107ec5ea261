//! Drains both output pipes of one process, then records its exit status

use super::reader::{LineError, LineReader};
use super::types::{ExitSlot, StreamSource};
use crate::subprocess::{ProcessError, ProcessHandle};

/// Receives every line a process writes, tagged with the pipe it came from.
pub trait LineHandler {
    fn on_line(&self, source: StreamSource, line: &[u8]) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum PumpError {
    #[error("failed to read {source_stream}: {error}")]
    Read {
        source_stream: StreamSource,
        #[source]
        error: std::io::Error,
    },

    #[error("{source_stream} handler failed: {error}")]
    Handler {
        source_stream: StreamSource,
        #[source]
        error: anyhow::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("status already recorded as {recorded}, refusing to overwrite with {collected}")]
    AlreadyRecorded { recorded: i32, collected: i32 },

    #[error("recorded status {recorded} but process reports {reported:?}")]
    StatusMismatch { recorded: i32, reported: Option<i32> },
}

impl PumpError {
    fn from_line(source_stream: StreamSource, error: LineError) -> Self {
        match error {
            LineError::Read(error) => PumpError::Read {
                source_stream,
                error,
            },
            LineError::Handler(error) => PumpError::Handler {
                source_stream,
                error,
            },
        }
    }
}

/// Line counts observed while pumping one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    pub status: i32,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
}

pub struct StreamPump<'a, H> {
    tag: &'a str,
    handler: &'a H,
}

impl<'a, H> StreamPump<'a, H>
where
    H: LineHandler,
{
    pub fn new(tag: &'a str, handler: &'a H) -> Self {
        Self { tag, handler }
    }

    /// Drain stdout and stderr concurrently, then wait for exit.
    ///
    /// The exit status is only awaited once both pipes reached end-of-stream,
    /// so every byte has been handed to the handler before the status is
    /// written into `slot`.
    pub async fn run(
        &self,
        handle: &mut ProcessHandle,
        slot: &ExitSlot,
    ) -> Result<PumpSummary, PumpError> {
        let stdout = handle.take_stdout()?;
        let stderr = handle.take_stderr()?;

        let stdout_reader = async {
            LineReader::new(stdout)
                .pump(|line| self.handler.on_line(StreamSource::Stdout, line))
                .await
                .map_err(|e| PumpError::from_line(StreamSource::Stdout, e))
        };
        let stderr_reader = async {
            LineReader::new(stderr)
                .pump(|line| self.handler.on_line(StreamSource::Stderr, line))
                .await
                .map_err(|e| PumpError::from_line(StreamSource::Stderr, e))
        };

        let (stdout_lines, stderr_lines) = tokio::try_join!(stdout_reader, stderr_reader)?;
        tracing::debug!("{} outputs presumably closed", self.tag);

        let status = handle.wait().await?;
        slot.set(status)
            .map_err(|recorded| PumpError::AlreadyRecorded {
                recorded,
                collected: status,
            })?;

        let reported = handle.reported_status()?;
        if reported != slot.get() {
            return Err(PumpError::StatusMismatch {
                recorded: status,
                reported,
            });
        }

        tracing::trace!(
            "{}: {} stdout line(s), {} stderr line(s), status {}",
            self.tag,
            stdout_lines,
            stderr_lines,
            status
        );

        Ok(PumpSummary {
            status,
            stdout_lines,
            stderr_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommand;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<(StreamSource, String)>>,
    }

    impl LineHandler for Recorder {
        fn on_line(&self, source: StreamSource, line: &[u8]) -> anyhow::Result<()> {
            self.lines
                .lock()
                .unwrap()
                .push((source, String::from_utf8_lossy(line).into_owned()));
            Ok(())
        }
    }

    struct FailOnStderr;

    impl LineHandler for FailOnStderr {
        fn on_line(&self, source: StreamSource, _line: &[u8]) -> anyhow::Result<()> {
            if source == StreamSource::Stderr {
                anyhow::bail!("stderr is not allowed");
            }
            Ok(())
        }
    }

    fn spawn(command_line: &str) -> ProcessHandle {
        ProcessHandle::spawn(&ProcessCommand::parse(command_line).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_pump_delivers_both_streams_before_status() {
        let recorder = Recorder::default();
        let slot = ExitSlot::new();
        let mut handle = spawn("sh -c 'echo out1; echo err1 >&2; echo out2; exit 4'");

        let summary = StreamPump::new("t", &recorder)
            .run(&mut handle, &slot)
            .await
            .unwrap();

        assert_eq!(summary.status, 4);
        assert_eq!(summary.stdout_lines, 2);
        assert_eq!(summary.stderr_lines, 1);
        assert_eq!(slot.get(), Some(4));

        let lines = recorder.lines.lock().unwrap();
        let stdout: Vec<_> = lines
            .iter()
            .filter(|(s, _)| *s == StreamSource::Stdout)
            .map(|(_, l)| l.as_str())
            .collect();
        assert_eq!(stdout, vec!["out1\n", "out2\n"]);
        assert!(lines.contains(&(StreamSource::Stderr, "err1\n".to_string())));
    }

    #[tokio::test]
    async fn test_pump_with_silent_stderr() {
        let recorder = Recorder::default();
        let slot = ExitSlot::new();
        let mut handle = spawn("sh -c 'echo only stdout; exit 2'");

        let summary = StreamPump::new("quiet", &recorder)
            .run(&mut handle, &slot)
            .await
            .unwrap();

        assert_eq!(summary.stderr_lines, 0);
        assert_eq!(summary.status, 2);
        assert!(recorder
            .lines
            .lock()
            .unwrap()
            .iter()
            .all(|(s, _)| *s == StreamSource::Stdout));
    }

    #[tokio::test]
    async fn test_pump_refuses_second_status() {
        let recorder = Recorder::default();
        let slot = ExitSlot::new();
        slot.set(11).unwrap();
        let mut handle = spawn("true");

        let err = StreamPump::new("again", &recorder)
            .run(&mut handle, &slot)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PumpError::AlreadyRecorded {
                recorded: 11,
                collected: 0
            }
        ));
        assert_eq!(slot.get(), Some(11));
    }

    #[tokio::test]
    async fn test_pump_propagates_handler_error() {
        let slot = ExitSlot::new();
        let mut handle = spawn("sh -c 'echo boom >&2'");

        let err = StreamPump::new("failing", &FailOnStderr)
            .run(&mut handle, &slot)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PumpError::Handler {
                source_stream: StreamSource::Stderr,
                ..
            }
        ));
        assert_eq!(slot.get(), None);
        let _ = handle.wait().await;
    }
}
