use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory sink that remembers every individual write.
///
/// Clones share the same buffer, so one clone can be handed to an
/// [`super::OutputSpec`] while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each write, lossily decoded.
    pub fn writes(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect()
    }

    /// Everything written so far, concatenated.
    pub fn contents(&self) -> String {
        self.writes().concat()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
