use thiserror::Error;

use crate::subprocess::streaming::{PumpError, StreamSource};
use crate::subprocess::ProcessError;

/// Errors surfaced by [`crate::Supervisor`] launches and runs.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Duplicate tag: {0}.")]
    DuplicateTag(String),

    #[error("Failed to launch process '{tag}': {source}")]
    Spawn {
        tag: String,
        #[source]
        source: ProcessError,
    },

    #[error("Failed to stream output of process '{tag}': {source}")]
    Stream {
        tag: String,
        #[source]
        source: ProcessError,
    },

    #[error("Output handler for process '{tag}' failed on {stream}: {source}")]
    Handler {
        tag: String,
        stream: StreamSource,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal consistency failure for process '{tag}': recorded status {recorded}, process reported {reported:?}")]
    InternalConsistency {
        tag: String,
        recorded: i32,
        reported: Option<i32>,
    },

    #[error("Failed to create the concurrency domain: {0}")]
    Domain(#[source] std::io::Error),

    #[error("Cannot start a blocking run from inside another async runtime")]
    ForeignRuntime,

    #[error("Process '{tag}' task panicked: {source}")]
    Panicked {
        tag: String,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("Chained process '{tag}' failed: {source}")]
    Detached {
        tag: String,
        #[source]
        source: Box<SupervisorError>,
    },
}

impl SupervisorError {
    /// Errors that indicate broken bookkeeping rather than a bad command or handler.
    pub fn is_fatal(&self) -> bool {
        match self {
            SupervisorError::InternalConsistency { .. } => true,
            SupervisorError::Detached { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// The tag of the launch that failed, when the error belongs to one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            SupervisorError::DuplicateTag(tag)
            | SupervisorError::Spawn { tag, .. }
            | SupervisorError::Stream { tag, .. }
            | SupervisorError::Handler { tag, .. }
            | SupervisorError::InternalConsistency { tag, .. }
            | SupervisorError::Panicked { tag, .. }
            | SupervisorError::Detached { tag, .. } => Some(tag),
            SupervisorError::Domain(_) | SupervisorError::ForeignRuntime => None,
        }
    }

    pub(crate) fn from_pump(tag: &str, error: PumpError) -> Self {
        let tag = tag.to_string();
        match error {
            PumpError::Read {
                error: source_error,
                ..
            } => SupervisorError::Stream {
                tag,
                source: ProcessError::Io(source_error),
            },
            PumpError::Handler {
                source_stream,
                error,
            } => SupervisorError::Handler {
                tag,
                stream: source_stream,
                source: error,
            },
            PumpError::Process(source) => SupervisorError::Stream { tag, source },
            PumpError::AlreadyRecorded {
                recorded,
                collected,
            } => SupervisorError::InternalConsistency {
                tag,
                recorded,
                reported: Some(collected),
            },
            PumpError::StatusMismatch { recorded, reported } => {
                SupervisorError::InternalConsistency {
                    tag,
                    recorded,
                    reported,
                }
            }
        }
    }
}
