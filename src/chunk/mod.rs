//! Chunk types and the stage that produces them.

use crate::error::{Error, Result};

pub mod lines;

pub use lines::LineChunker;

/// A sequence-numbered run of raw lines.
///
/// Built by the chunker, read-only afterwards. The last chunk of a stream may
/// be shorter than the configured size and may carry the condition that ended
/// the stream (a read failure or cancellation).
#[derive(Debug)]
pub struct LineChunk {
    id: u64,
    first_line: u64,
    lines: Vec<String>,
    terminal: Option<Error>,
}

impl LineChunk {
    pub(crate) fn new(id: u64, first_line: u64, lines: Vec<String>) -> Self {
        Self {
            id,
            first_line,
            lines,
            terminal: None,
        }
    }

    pub(crate) fn terminal(id: u64, first_line: u64, lines: Vec<String>, err: Error) -> Self {
        Self {
            id,
            first_line,
            lines,
            terminal: Some(err),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// 0-based stream position of the first line in this chunk.
    pub fn first_line(&self) -> u64 {
        self.first_line
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether this chunk ends the stream with an error.
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub(crate) fn into_parts(self) -> (u64, u64, Vec<String>, Option<Error>) {
        (self.id, self.first_line, self.lines, self.terminal)
    }
}

/// Transformed values for one [`LineChunk`], in line order.
///
/// `data` holds only the kept values. When `err` is set, `data` holds what was
/// produced before the failure and this is the last chunk the reader delivers.
#[derive(Debug)]
pub struct ResultChunk<T> {
    pub id: u64,
    pub data: Vec<T>,
    pub err: Option<Error>,
}

impl<T> ResultChunk<T> {
    pub fn new(id: u64, data: Vec<T>) -> Self {
        Self {
            id,
            data,
            err: None,
        }
    }

    pub fn failed(id: u64, data: Vec<T>, err: Error) -> Self {
        Self {
            id,
            data,
            err: Some(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        self.err.as_ref().is_some_and(Error::is_cancelled)
    }

    /// The chunk's data, or its error if it has one.
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}
