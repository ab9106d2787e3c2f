use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;

/// Handles to a pipeline running on its own Tokio task.
pub struct Spawned<I, O> {
    pub input: mpsc::Sender<I>,
    pub output: mpsc::Receiver<O>,
    pub handle: JoinHandle<Result<()>>,
}

/// Spawns a [`Pipe`] with bounded input and output queues.
pub struct Runtime {
    buffer: usize,
}

impl Runtime {
    pub fn new() -> Self {
        Self { buffer: 128 }
    }

    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Start `pipe` on a new task, observing `cancel`.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn spawn<I, O, P>(&self, pipe: P, cancel: CancelToken) -> Spawned<I, O>
    where
        I: Send + 'static,
        O: Send + 'static,
        P: Pipe<I, O> + Send + Sync + 'static,
    {
        let (tx_in, rx_in) = mpsc::channel::<I>(self.buffer);
        let (tx_out, rx_out) = mpsc::channel::<O>(self.buffer);

        let buffer = self.buffer;

        #[cfg(feature = "tracing")]
        let handle = {
            use tracing::Instrument;
            let stage = pipe.stage_name();
            let span = tracing::info_span!("linepipe.stage", stage = stage, buffer = buffer);
            tokio::spawn(
                async move { pipe.process(rx_in, tx_out, buffer, cancel).await }.instrument(span),
            )
        };

        #[cfg(not(feature = "tracing"))]
        let handle = tokio::spawn(async move { pipe.process(rx_in, tx_out, buffer, cancel).await });

        Spawned {
            input: tx_in,
            output: rx_out,
            handle,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
