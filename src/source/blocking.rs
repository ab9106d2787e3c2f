use std::io::BufRead;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::source::LineSource;

const DEFAULT_CAPACITY: usize = 1024;

/// Drives a blocking [`BufRead`] on Tokio's blocking pool.
///
/// Lines are handed over through a bounded queue, so a slow pipeline throttles
/// the reader thread. Closing the source stops the thread at its next hand-off;
/// a thread parked inside `read_line` (an idle stdin, say) lingers until that
/// read returns.
pub struct BlockingSource {
    lines: mpsc::Receiver<std::io::Result<String>>,
}

impl BlockingSource {
    pub fn new<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self::with_capacity(reader, DEFAULT_CAPACITY)
    }

    pub fn with_capacity<R>(mut reader: R, capacity: usize) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        tokio::task::spawn_blocking(move || loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.blocking_send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.blocking_send(Err(err));
                    break;
                }
            }
        });

        Self { lines: rx }
    }

    /// Transparently decompress a (possibly multi-member) gzip file.
    #[cfg(feature = "gzip")]
    pub fn gzip(file: std::fs::File) -> Self {
        let decoder = flate2::read::MultiGzDecoder::new(file);
        Self::new(std::io::BufReader::new(decoder))
    }
}

#[async_trait]
impl LineSource for BlockingSource {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        match self.lines.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.lines.close();
        Ok(())
    }
}
