//! The consumer-facing reader.
//!
//! [`BufferedReader`] wires `LineChunker -> TransformPool -> Reorderer` into
//! one spawned task and hands out the ordered output queue. Results arrive as
//! [`ResultChunk`]s; the queue ending means the pipeline is finished, and the
//! last chunk may carry the error that ended it.
//!
//! Cancellation is cooperative. A transform call that is already running is
//! never interrupted, so a transform that hangs delays shutdown for as long as
//! it hangs. After cancelling, keep draining the reader (or drop it) so the
//! stages can wind down.

use std::path::Path;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::chunk::{LineChunker, ResultChunk};
use crate::collect::Reorderer;
use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::chain::PipeExt;
use crate::pipeline::config::ReaderConfig;
use crate::pipeline::runtime::Runtime;
use crate::pipeline::state::{PipelineState, StateCell};
use crate::source::{self, LineSource};
use crate::transform::{Transform, TransformPool, TrimNewline};

/// Cloneable handle that stops a [`BufferedReader`].
///
/// Safe to call any number of times, from any task, before or after the
/// pipeline finished. Only the token is touched here; the reorderer notices
/// it and moves the pipeline to `Draining`.
#[derive(Debug, Clone)]
pub struct Canceller {
    token: CancelToken,
    state: StateCell,
}

impl Canceller {
    pub fn cancel(&self) {
        if self.state.is_finished() {
            return;
        }
        if self.token.cancel() {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "linepipe.cancel.requested", "linepipe.cancel.requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Reads a line stream, transforms it in parallel and yields the results in
/// input order.
pub struct BufferedReader<T> {
    output: mpsc::Receiver<ResultChunk<T>>,
    canceller: Canceller,
    handle: Option<JoinHandle<Result<()>>>,
    config: ReaderConfig,
}

impl<T> BufferedReader<T>
where
    T: Send + 'static,
{
    /// Start reading `source`. Must be called from inside a Tokio runtime.
    pub fn new<S, F>(source: S, config: ReaderConfig, transform: F) -> Self
    where
        S: LineSource + 'static,
        F: Transform<T>,
    {
        let state = StateCell::new();
        let cancel = CancelToken::new();
        let workers = config.get_buffer_size();

        let pipe = LineChunker::new(source, config.get_chunk_size())
            .pipe::<ResultChunk<T>, _>(TransformPool::new(transform, workers))
            .pipe::<ResultChunk<T>, _>(Reorderer::new(state.clone()));

        let spawned = Runtime::new().buffer(workers).spawn(pipe, cancel.clone());

        // Start signal. The chunker also starts if the sender is simply dropped.
        let _ = spawned.input.try_send(());

        Self {
            output: spawned.output,
            canceller: Canceller {
                token: cancel,
                state,
            },
            handle: Some(spawned.handle),
            config,
        }
    }

    /// Open `path` (see [`source::open`]) and start reading it.
    pub async fn open<F>(path: impl AsRef<Path>, config: ReaderConfig, transform: F) -> Result<Self>
    where
        F: Transform<T>,
    {
        let source = source::open(path).await?;
        Ok(Self::new(source, config, transform))
    }

    /// Next chunk in order, or `None` once the pipeline has finished.
    pub async fn recv(&mut self) -> Option<ResultChunk<T>> {
        self.output.recv().await
    }

    /// Non-blocking poll. `Err(TryRecvError::Disconnected)` means finished.
    pub fn try_recv(&mut self) -> std::result::Result<ResultChunk<T>, TryRecvError> {
        self.output.try_recv()
    }

    /// Blocking variant of [`recv`](Self::recv) for synchronous consumers.
    ///
    /// Panics if called from within an async context, like
    /// [`mpsc::Receiver::blocking_recv`].
    pub fn blocking_recv(&mut self) -> Option<ResultChunk<T>> {
        self.output.blocking_recv()
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.canceller.state.get()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Stop consuming and wait for the background task.
    ///
    /// Chunks not yet received are discarded and reading stops. Errors
    /// returned here are plumbing failures; data errors travel on the chunks
    /// themselves.
    pub async fn join(mut self) -> Result<()> {
        self.output.close();
        // Bypasses the Finished check: stages upstream of the reorderer may
        // still be running after it finished.
        self.canceller.token.cancel();
        match self.handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }

    /// Drain every chunk and concatenate the data, stopping at the first
    /// chunk error.
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(chunk) = self.recv().await {
            match chunk.into_result() {
                Ok(data) => all.extend(data),
                Err(err) => {
                    self.join().await?;
                    return Err(err);
                }
            }
        }
        self.join().await?;
        Ok(all)
    }
}

impl BufferedReader<String> {
    /// Open `path` with the default configuration, keeping every line with its
    /// newline trimmed.
    pub async fn open_default(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, ReaderConfig::default(), TrimNewline).await
    }
}

impl<T> Drop for BufferedReader<T> {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}
