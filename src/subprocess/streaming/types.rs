//! Core types for streaming infrastructure

use std::fmt;
use std::sync::{Arc, OnceLock};

/// Stream source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl StreamSource {
    pub fn name(&self) -> &'static str {
        match self {
            StreamSource::Stdout => "stdout",
            StreamSource::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write-once cell holding a process's final status.
///
/// Clones share the same cell, so the registry and the pump that fills it
/// observe the same value.
#[derive(Debug, Clone, Default)]
pub struct ExitSlot(Arc<OnceLock<i32>>);

impl ExitSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<i32> {
        self.0.get().copied()
    }

    /// Record `status`. Fails with the already stored value on a second call.
    pub fn set(&self, status: i32) -> Result<(), i32> {
        self.0.set(status).map_err(|_| self.get().unwrap_or(status))
    }

    pub fn is_set(&self) -> bool {
        self.0.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_slot_is_write_once() {
        let slot = ExitSlot::new();
        let shared = slot.clone();
        assert_eq!(slot.get(), None);

        shared.set(3).unwrap();
        assert_eq!(slot.get(), Some(3));
        assert_eq!(slot.set(4), Err(3));
        assert_eq!(shared.get(), Some(3));
    }

    #[test]
    fn test_stream_source_display() {
        assert_eq!(StreamSource::Stdout.to_string(), "stdout");
        assert_eq!(StreamSource::Stderr.to_string(), "stderr");
    }
}
