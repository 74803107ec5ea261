use std::io;

/// Failures raised while preparing, spawning or driving a single child process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Failed to parse command line `{command_line}`: {source}")]
    Parse {
        command_line: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to capture {0}")]
    MissingPipe(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ProcessError {
    /// True for errors that happen before any OS process exists.
    pub fn is_spawn_error(&self) -> bool {
        matches!(
            self,
            ProcessError::EmptyCommand
                | ProcessError::Parse { .. }
                | ProcessError::CommandNotFound(_)
                | ProcessError::SpawnFailed { .. }
        )
    }
}
