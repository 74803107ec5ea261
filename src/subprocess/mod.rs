//! Process spawning and output streaming primitives

pub mod command;
pub mod error;
pub mod handle;
pub mod streaming;

pub use command::{ProcessCommand, ProcessCommandBuilder};
pub use error::ProcessError;
pub use handle::{exit_code, ProcessHandle};
