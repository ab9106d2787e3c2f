use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::{LineChunk, ResultChunk};
use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::pipe::Pipe;
use crate::transform::{Outcome, Transform};

/// Applies a [`Transform`] to whole chunks on a bounded set of workers.
///
/// At most `workers` chunks are transformed at once; admission is a semaphore
/// permit held for the duration of one chunk. Lines inside a chunk are handled
/// in order by a single worker on Tokio's blocking pool.
///
/// Every admitted chunk yields exactly one [`ResultChunk`] with the same id,
/// including when the transform fails or panics. After the first failed
/// chunk, the pool stops receiving: chunks already admitted finish, anything
/// received afterwards is dropped unprocessed.
///
/// The pool does not look at the cancel token. Cancellation reaches it as the
/// chunker's terminal chunk, and in-flight transform calls always run to
/// completion.
pub struct TransformPool<F, T> {
    transform: Arc<F>,
    workers: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> TransformPool<F, T> {
    pub fn new(transform: F, workers: usize) -> Self {
        Self {
            transform: Arc::new(transform),
            workers: workers.max(1),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Pipe<LineChunk, ResultChunk<T>> for TransformPool<F, T>
where
    F: Transform<T>,
    T: Send + 'static,
{
    fn stage_name(&self) -> &'static str {
        "transform_pool"
    }

    async fn process(
        &self,
        mut input: Receiver<LineChunk>,
        output: Sender<ResultChunk<T>>,
        _buffer: usize,
        _cancel: CancelToken,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        let stage = self.stage_name();

        let admission = Arc::new(Semaphore::new(self.workers));
        let failed = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        while let Some(chunk) = input.recv().await {
            let Ok(permit) = admission.clone().acquire_owned().await else {
                break;
            };
            if failed.load(Ordering::Acquire) {
                break;
            }
            if output.is_closed() {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "linepipe.downstream.closed", stage = stage, "linepipe.downstream.closed");
                break;
            }

            let transform = self.transform.clone();
            let failed = failed.clone();
            let output = output.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let id = chunk.id();

                let result = tokio::task::spawn_blocking(move || apply(chunk, transform.as_ref()))
                    .await
                    .unwrap_or_else(|join| ResultChunk::failed(id, Vec::new(), Error::Join(join)));

                if let Some(_err) = &result.err {
                    if failed
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::WARN, event = "linepipe.transform.failed", stage = "transform_pool", id = id, error = %_err, "linepipe.transform.failed");
                    }
                }

                if output.send(result).await.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::INFO, event = "linepipe.downstream.closed", stage = "transform_pool", id = id, "linepipe.downstream.closed");
                }
            });

            while let Some(done) = tasks.try_join_next() {
                done?;
            }
        }

        // Stop accepting: the chunker sees its next hand-off fail.
        drop(input);

        while let Some(done) = tasks.join_next().await {
            done?;
        }
        Ok(())
    }
}

/// Transform one chunk, line by line, stopping at the first failure.
fn apply<F, T>(chunk: LineChunk, transform: &F) -> ResultChunk<T>
where
    F: Transform<T>,
{
    let (id, first_line, lines, terminal) = chunk.into_parts();
    let mut data = Vec::with_capacity(lines.len());

    for (offset, line) in (first_line..).zip(lines.iter()) {
        match transform.apply(line) {
            Outcome::Keep(value) => data.push(value),
            Outcome::Skip => {}
            Outcome::Fail(err) => {
                return ResultChunk::failed(id, data, Error::transform(offset + 1, err));
            }
        }
    }

    ResultChunk {
        id,
        data,
        err: terminal,
    }
}
