//! Stop an endless stream after a fixed number of chunks.
//!
//! Run with:
//! ```bash
//! cargo run --example cancel_midstream
//! ```
//!
//! The source never ends, so the only way out is `cancel()`. The consumer
//! polls with `try_recv`, cancels once it has seen enough, and keeps draining
//! until the chunk carrying the cancellation arrives.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use linepipe::error::Result;
use linepipe::prelude::*;
use linepipe::source::LineSource;
use linepipe::transform::trim_newline;
use tokio::sync::mpsc::error::TryRecvError;

/// Emits `tick N` lines forever.
struct Ticker {
    next: u64,
}

#[async_trait]
impl LineSource for Ticker {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        tokio::task::yield_now().await;
        let line = format!("tick {}\n", self.next);
        self.next += 1;
        Ok(Some(line))
    }

    async fn close(&mut self) -> std::io::Result<()> {
        println!("source closed after {} lines", self.next);
        Ok(())
    }
}

fn parse_tick(line: &str) -> Outcome<u64> {
    let Some(n) = trim_newline(line).strip_prefix("tick ") else {
        return Outcome::Skip;
    };
    // Pretend parsing is expensive.
    std::thread::sleep(Duration::from_micros(50));
    n.parse::<u64>().map(Some).into()
}

#[tokio::main]
async fn main() -> Result<()> {
    const STOP_AFTER: usize = 5;

    let config = ReaderConfig::new().buffer_size(4).chunk_size(100);
    let mut reader = BufferedReader::new(Ticker { next: 0 }, config, parse_tick);

    let started = Instant::now();
    let mut seen = 0_usize;
    let mut total = 0_u64;

    loop {
        match reader.try_recv() {
            Ok(chunk) => {
                seen += 1;
                total += chunk.data.iter().sum::<u64>();
                if let Some(err) = &chunk.err {
                    println!("chunk {} ended the stream: {err}", chunk.id);
                    break;
                }
                println!("chunk {} with {} values", chunk.id, chunk.data.len());
                if seen == STOP_AFTER {
                    println!("cancelling");
                    reader.cancel();
                }
            }
            Err(TryRecvError::Empty) => tokio::task::yield_now().await,
            Err(TryRecvError::Disconnected) => break,
        }
    }

    println!(
        "{seen} chunks, sum {total}, state {:?}, {:?}",
        reader.state(),
        started.elapsed()
    );
    reader.join().await
}
