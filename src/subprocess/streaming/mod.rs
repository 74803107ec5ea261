//! Real-time streaming infrastructure for subprocess output
//!
//! A [`LineReader`] turns one pipe into a sequence of raw lines, and a
//! [`StreamPump`] runs two of them side by side for a single process before
//! collecting its exit status.

pub mod pump;
pub mod reader;
pub mod types;

pub use pump::{LineHandler, PumpError, PumpSummary, StreamPump};
pub use reader::{LineError, LineReader};
pub use types::{ExitSlot, StreamSource};
