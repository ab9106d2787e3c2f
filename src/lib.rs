//! # linepipe
//!
//! **Parallel line processing that keeps the input order.**
//!
//! `linepipe` reads a text stream, cuts it into fixed-size chunks of lines,
//! runs a per-line transform on several chunks at once and hands the results
//! back **in the order the lines were read**. Reading can be cancelled at any
//! point without races.
//!
//! It is built for the boring, large inputs:
//!
//! - log files, TSV dumps, NDJSON exports (GBs, not MBs)
//! - bounded memory and backpressure end to end
//! - async execution on Tokio
//! - one consistent shutdown path for EOF, errors and cancellation
//!
//! ---
//!
//! ## Core Model
//!
//! ```text
//! LineSource → LineChunker → TransformPool → Reorderer → output queue
//! ```
//!
//! Each stage implements the [`Pipe`] trait and talks to its neighbours over
//! bounded Tokio channels. The chunker numbers chunks from 0; the pool
//! transforms up to `buffer_size` chunks at a time; the reorderer releases them
//! in id order.
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use linepipe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> linepipe::error::Result<()> {
//!     let config = ReaderConfig::new().buffer_size(4).chunk_size(10_000);
//!
//!     let mut reader = BufferedReader::open("data.tsv", config, |line: &str| {
//!         let line = linepipe::transform::trim_newline(line);
//!         if line.is_empty() || line.starts_with('#') {
//!             return Outcome::Skip;
//!         }
//!         Outcome::Keep(line.split('\t').map(str::to_owned).collect::<Vec<_>>())
//!     })
//!     .await?;
//!
//!     while let Some(chunk) = reader.recv().await {
//!         for fields in chunk.into_result()? {
//!             println!("{fields:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Transform Contract
//!
//! A transform is any `Fn(&str) -> Outcome<T>` (or a type implementing
//! [`Transform`]). Lines arrive with their terminator attached.
//!
//! - `Outcome::Keep(v)`: `v` goes into the chunk's data
//! - `Outcome::Skip`: the line is filtered out
//! - `Outcome::Fail(err)`: the rest of the chunk is abandoned, the chunk is
//!   delivered with what it had plus the error, and the pipeline ends
//!
//! ---
//!
//! ## Cancellation
//!
//! ```no_run
//! # use linepipe::prelude::*;
//! # async fn demo(mut reader: BufferedReader<String>) {
//! loop {
//!     match reader.try_recv() {
//!         Ok(chunk) => {
//!             if chunk.err.is_some() {
//!                 break;
//!             }
//!             reader.cancel();
//!         }
//!         Err(tokio::sync::mpsc::error::TryRecvError::Empty) => tokio::task::yield_now().await,
//!         Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => break,
//!     }
//! }
//! # }
//! ```
//!
//! The chunker checks the token before every read and ends the stream with a
//! chunk carrying [`Error::Cancelled`]. Transform calls already running are
//! never interrupted.
//!
//! ---
//!
//! ## API Contracts
//!
//! - Order: chunk ids seen by the consumer are `0, 1, 2, …` with no gaps.
//! - Termination: the output ends exactly once; the last chunk may carry the
//!   error (source failure, transform failure, cancellation) that ended it.
//! - Bounded work: at most `buffer_size` chunks are transformed at once, and
//!   every queue between stages holds at most `buffer_size` chunks.
//! - No retries: a failing source or transform ends the pipeline.
//!
//! ---
//!
//! ## Observability
//!
//! With the default `tracing` feature, stages emit structured events such as
//! `linepipe.cancelled`, `linepipe.source.failed`,
//! `linepipe.transform.failed`, `linepipe.reorder.terminal`,
//! `linepipe.downstream.closed` and `linepipe.finished`, inside a
//! `linepipe.stage` span.
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_target(false)
//!     .with_env_filter("linepipe=debug")
//!     .init();
//! ```
//!
//! ---
//!
//! ## Feature Flags
//!
//! - `tracing` *(default)*: structured events and spans.
//! - `ndjson`: [`ndjson::NdjsonTransform`], one JSON value per line.
//! - `gzip`: transparent decompression of `.gz` inputs in [`source::open`].
//!
//! [`Pipe`]: pipeline::pipe::Pipe
//! [`Transform`]: transform::Transform
//! [`Error::Cancelled`]: error::Error::Cancelled

pub mod chunk;
pub mod collect;
pub mod error;
#[cfg(feature = "ndjson")]
pub mod ndjson;
pub mod pipeline;
pub mod reader;
pub mod source;
pub mod transform;

pub mod prelude {
    //! Convenient imports for most `linepipe` users.

    pub use crate::chunk::ResultChunk;
    pub use crate::pipeline::config::ReaderConfig;
    pub use crate::pipeline::state::PipelineState;
    pub use crate::reader::{BufferedReader, Canceller};
    pub use crate::transform::{Outcome, Transform, TrimNewline};
}
