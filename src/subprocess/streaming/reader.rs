//! Newline-delimited reading from a single byte pipe

use futures::stream::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Why a reader stopped before reaching end-of-stream.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("line handler failed: {0}")]
    Handler(#[source] anyhow::Error),
}

/// Pulls raw lines out of an async byte source.
///
/// Lines are delivered as bytes with their trailing `\n` still attached; a
/// final unterminated chunk is delivered as-is. A zero-length read ends the
/// reader and every later call yields `None`.
pub struct LineReader<R> {
    reader: BufReader<R>,
    finished: bool,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
            finished: false,
        }
    }

    pub async fn next_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }

        let mut line = Vec::new();
        let read = self.reader.read_until(b'\n', &mut line).await?;
        if read == 0 {
            self.finished = true;
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Feed every line to `on_line` until end-of-stream.
    ///
    /// Returns the number of lines delivered. The first handler error stops
    /// the reader and is returned unchanged.
    pub async fn pump<F>(mut self, mut on_line: F) -> Result<usize, LineError>
    where
        F: FnMut(&[u8]) -> anyhow::Result<()>,
    {
        let mut delivered = 0;
        while let Some(line) = self.next_line().await? {
            on_line(&line).map_err(LineError::Handler)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Convert the reader into a lazy stream of lines.
    pub fn into_stream(self) -> impl Stream<Item = std::io::Result<Vec<u8>>>
    where
        R: Send + 'static,
    {
        futures::stream::unfold(self, |mut reader| async move {
            match reader.next_line().await {
                Ok(Some(line)) => Some((Ok(line), reader)),
                Ok(None) => None,
                Err(e) => {
                    reader.finished = true;
                    Some((Err(e), reader))
                }
            }
        })
    }
}
