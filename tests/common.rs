#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use linepipe::chunk::ResultChunk;
use linepipe::reader::BufferedReader;
use linepipe::source::LineSource;

#[derive(Clone, Default)]
pub struct Counters {
    pub reads: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl Counters {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Line source that records reads and closes, and can fail, stall or never end.
pub struct TrackedSource {
    lines: VecDeque<String>,
    endless: bool,
    stall: bool,
    stall_at_end: bool,
    fail_after: Option<usize>,
    served: usize,
    closed: bool,
    counters: Counters,
}

impl TrackedSource {
    pub fn new(lines: Vec<String>) -> (Self, Counters) {
        let counters = Counters::default();
        let source = Self {
            lines: lines.into(),
            endless: false,
            stall: false,
            stall_at_end: false,
            fail_after: None,
            served: 0,
            closed: false,
            counters: counters.clone(),
        };
        (source, counters)
    }

    /// Produces `line-N\n` forever.
    pub fn endless() -> (Self, Counters) {
        let (mut source, counters) = Self::new(Vec::new());
        source.endless = true;
        (source, counters)
    }

    /// Never returns from `next_line`.
    pub fn stalled() -> (Self, Counters) {
        let (mut source, counters) = Self::new(Vec::new());
        source.stall = true;
        (source, counters)
    }

    /// Once the lines run out, never return instead of reporting the end.
    pub fn then_stall(mut self) -> Self {
        self.stall_at_end = true;
        self
    }

    /// Fail the read following the first `n` lines.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl LineSource for TrackedSource {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);

        if self.closed {
            return Err(std::io::Error::other("read after close"));
        }
        if self.fail_after == Some(self.served) {
            return Err(std::io::Error::other("disk on fire"));
        }
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.endless {
            tokio::task::yield_now().await;
            let line = format!("line-{}\n", self.served);
            self.served += 1;
            return Ok(Some(line));
        }

        let line = self.lines.pop_front();
        match line {
            Some(_) => self.served += 1,
            None if self.stall_at_end => std::future::pending::<()>().await,
            None => {}
        }
        Ok(line)
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.closed = true;
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `line-0\n`, `line-1\n`, ...
pub fn numbered(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("line-{i}\n")).collect()
}

pub async fn drain<T>(reader: &mut BufferedReader<T>) -> Vec<ResultChunk<T>>
where
    T: Send + 'static,
{
    let mut chunks = Vec::new();
    while let Some(chunk) = reader.recv().await {
        chunks.push(chunk);
    }
    chunks
}

pub fn assert_contiguous<T>(chunks: &[ResultChunk<T>]) {
    let ids: Vec<u64> = chunks.iter().map(|c| c.id).collect();
    let expected: Vec<u64> = (0..chunks.len() as u64).collect();
    assert_eq!(ids, expected, "chunk ids must be 0..n without gaps");
}

pub fn flatten<T>(chunks: Vec<ResultChunk<T>>) -> Vec<T> {
    chunks.into_iter().flat_map(|c| c.data).collect()
}
