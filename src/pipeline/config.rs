use std::num::NonZeroUsize;

/// Lines per chunk when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Construction parameters for a [`BufferedReader`](crate::reader::BufferedReader).
///
/// Both values are clamped to at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    buffer_size: usize,
    chunk_size: usize,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Maximum number of chunks transformed at once. Also the capacity of
    /// every queue between stages and of the output queue.
    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n.max(1);
        self
    }

    /// Number of lines grouped into one chunk.
    pub fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n.max(1);
        self
    }

    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_buffer_size() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
