use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::chunk::ResultChunk;
use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::pipeline::state::StateCell;

/// Restores chunk order after the worker pool.
///
/// Chunks are forwarded in strictly increasing id order starting at 0.
/// Early arrivals wait in a side buffer keyed by id. The first error chunk by
/// id becomes the terminal chunk: it is delivered once every lower id has
/// been, and anything numbered above it is discarded.
///
/// This stage owns the pipeline's output sender; returning drops it, which
/// closes the output queue. It also owns the `Draining` and `Finished`
/// transitions of the shared [`StateCell`], moving to `Draining` as soon as it
/// sees the cancel token fire or records a terminal chunk.
///
/// Recording a terminal chunk, or losing the consumer, cancels the token so
/// the chunker stops reading and closes its source.
pub struct Reorderer<T> {
    state: StateCell,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Reorderer<T> {
    pub fn new(state: StateCell) -> Self {
        Self {
            state,
            _marker: PhantomData,
        }
    }
}

struct Emitter<T> {
    output: Sender<ResultChunk<T>>,
    next: u64,
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    delivered: u64,
}

impl<T> Emitter<T> {
    /// Returns `false` once the consumer has gone away.
    async fn emit(&mut self, chunk: ResultChunk<T>) -> bool {
        let id = chunk.id;
        if self.output.send(chunk).await.is_err() {
            return false;
        }
        self.next = self.next.max(id + 1);
        self.delivered += 1;
        true
    }
}

#[async_trait]
impl<T> Pipe<ResultChunk<T>, ResultChunk<T>> for Reorderer<T>
where
    T: Send + 'static,
{
    fn stage_name(&self) -> &'static str {
        "reorderer"
    }

    async fn process(
        &self,
        mut input: Receiver<ResultChunk<T>>,
        output: Sender<ResultChunk<T>>,
        _buffer: usize,
        cancel: CancelToken,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        let stage = self.stage_name();

        let mut out = Emitter {
            output,
            next: 0,
            delivered: 0,
        };
        let mut pending: HashMap<u64, ResultChunk<T>> = HashMap::new();
        let mut terminal: Option<ResultChunk<T>> = None;
        let mut cancel_seen = false;

        let consumer_alive = 'collect: loop {
            if terminal.as_ref().is_some_and(|t| t.id <= out.next) {
                break true;
            }

            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !cancel_seen => {
                    cancel_seen = true;
                    self.state.begin_draining();
                    continue;
                }
                chunk = input.recv() => chunk,
            };
            let Some(chunk) = chunk else {
                break true;
            };

            if chunk.err.is_some() {
                if terminal.as_ref().map_or(true, |t| chunk.id < t.id) {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "linepipe.reorder.terminal", stage = stage, id = chunk.id, "linepipe.reorder.terminal");
                    self.state.begin_draining();
                    // Nothing past the terminal chunk is delivered, so stop
                    // reading now rather than at the next full chunk.
                    cancel.cancel();
                    pending.retain(|id, _| *id < chunk.id);
                    terminal = Some(chunk);
                }
                continue;
            }

            if terminal.as_ref().is_some_and(|t| chunk.id > t.id) {
                continue;
            }

            if chunk.id > out.next {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::TRACE, event = "linepipe.reorder.buffered", stage = stage, id = chunk.id, next = out.next, "linepipe.reorder.buffered");
                pending.insert(chunk.id, chunk);
                continue;
            }

            if chunk.id < out.next {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::WARN, event = "linepipe.reorder.stale", stage = stage, id = chunk.id, next = out.next, "linepipe.reorder.stale");
                continue;
            }

            if !out.emit(chunk).await {
                break false;
            }
            while let Some(ready) = pending.remove(&out.next) {
                if !out.emit(ready).await {
                    break 'collect false;
                }
            }
        };

        // Upstream workers still sending see a closed queue from here on.
        drop(input);
        self.state.begin_draining();
        if !consumer_alive {
            cancel.cancel();
        }

        if consumer_alive {
            let mut rest: Vec<_> = pending.into_values().collect();
            rest.sort_unstable_by_key(|chunk| chunk.id);

            let mut alive = true;
            for chunk in rest {
                if !out.emit(chunk).await {
                    alive = false;
                    break;
                }
            }
            if alive {
                if let Some(last) = terminal {
                    out.emit(last).await;
                }
            }
        }

        #[cfg(feature = "tracing")]
        {
            if !consumer_alive {
                tracing::event!(tracing::Level::INFO, event = "linepipe.downstream.closed", stage = stage, "linepipe.downstream.closed");
            }
            tracing::event!(tracing::Level::DEBUG, event = "linepipe.finished", stage = stage, delivered = out.delivered, "linepipe.finished");
        }

        // Finished is published before the queue closes, so a consumer that
        // sees the end of the output also sees Finished.
        self.state.finish();
        drop(out);
        Ok(())
    }
}
