use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::chunk::LineChunk;
use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::source::LineSource;

/// Upper bound on lines preallocated per chunk buffer.
const PREALLOC_LINES: usize = 4096;

/// Groups consecutive lines into numbered [`LineChunk`]s.
///
/// The chunker owns its source and closes it exactly once, whichever way the
/// stream ends. Cancellation is checked before every read; the chunk in
/// progress is then sent as the terminal chunk carrying [`Error::Cancelled`].
pub struct LineChunker<S> {
    source: Mutex<Option<S>>,
    chunk_size: usize,
}

impl<S> LineChunker<S> {
    pub fn new(source: S, chunk_size: usize) -> Self {
        Self {
            source: Mutex::new(Some(source)),
            chunk_size: chunk_size.max(1),
        }
    }

    fn take_source(&self) -> Result<S> {
        let mut slot = self
            .source
            .lock()
            .map_err(|_| Error::pipeline("line source lock poisoned"))?;
        slot.take()
            .ok_or_else(|| Error::pipeline("line source already consumed"))
    }

    fn fresh_buffer(&self) -> Vec<String> {
        Vec::with_capacity(self.chunk_size.min(PREALLOC_LINES))
    }
}

enum Stop {
    Exhausted,
    Failed(Error),
    DownstreamClosed,
}

#[async_trait]
impl<S> Pipe<(), LineChunk> for LineChunker<S>
where
    S: LineSource + 'static,
{
    fn stage_name(&self) -> &'static str {
        "line_chunker"
    }

    async fn process(
        &self,
        mut input: Receiver<()>,
        output: Sender<LineChunk>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        let stage = self.stage_name();

        let mut source = self.take_source()?;

        // Wait for the start signal. A cancel here still goes through the loop
        // below so the consumer gets a terminal chunk.
        tokio::select! {
            _ = cancel.cancelled() => {},
            _ = input.recv() => {}
        }

        let mut id = 0u64;
        let mut first_line = 0u64;
        let mut buf = self.fresh_buffer();

        let stop = loop {
            if cancel.is_cancelled() {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "linepipe.cancelled", stage = stage, where_ = "before_read", "linepipe.cancelled");
                break Stop::Failed(Error::Cancelled);
            }

            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                read = source.next_line() => Some(read),
            };
            let Some(read) = read else {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "linepipe.cancelled", stage = stage, where_ = "read", "linepipe.cancelled");
                break Stop::Failed(Error::Cancelled);
            };

            match read {
                Ok(Some(line)) => {
                    buf.push(line);
                    if buf.len() < self.chunk_size {
                        continue;
                    }

                    let lines = std::mem::replace(&mut buf, self.fresh_buffer());
                    let count = lines.len() as u64;

                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::TRACE, event = "linepipe.chunk.emitted", stage = stage, id = id, lines = count, "linepipe.chunk.emitted");

                    if output.send(LineChunk::new(id, first_line, lines)).await.is_err() {
                        break Stop::DownstreamClosed;
                    }
                    id += 1;
                    first_line += count;
                }
                Ok(None) => break Stop::Exhausted,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::WARN, event = "linepipe.source.failed", stage = stage, id = id, error = %err, "linepipe.source.failed");
                    break Stop::Failed(Error::Source(err));
                }
            }
        };

        let closed = source.close().await;
        drop(source);

        #[cfg(feature = "tracing")]
        if let Err(err) = &closed {
            tracing::event!(tracing::Level::WARN, event = "linepipe.source.close_failed", stage = stage, error = %err, "linepipe.source.close_failed");
        }

        let last = match stop {
            Stop::DownstreamClosed => {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "linepipe.downstream.closed", stage = stage, "linepipe.downstream.closed");
                return Ok(());
            }
            Stop::Exhausted => match closed {
                Ok(()) => LineChunk::new(id, first_line, buf),
                Err(err) => LineChunk::terminal(id, first_line, buf, Error::Source(err)),
            },
            Stop::Failed(err) => LineChunk::terminal(id, first_line, buf, err),
        };

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::TRACE, event = "linepipe.chunk.emitted", stage = stage, id = id, lines = last.len() as u64, "linepipe.chunk.emitted");

        if output.send(last).await.is_err() {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::INFO, event = "linepipe.downstream.closed", stage = stage, "linepipe.downstream.closed");
        }
        Ok(())
    }
}
