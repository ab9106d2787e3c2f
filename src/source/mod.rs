//! Line sources feeding the chunker.
//!
//! A [`LineSource`] yields one line at a time, terminator included, and is
//! closed exactly once by the stage that owns it.

use async_trait::async_trait;

pub mod blocking;
pub mod fs;
pub mod memory;
pub mod reader;

pub use blocking::BlockingSource;
pub use fs::{open, open_stdin, FileSource, StdinSource};
pub use memory::MemorySource;
pub use reader::ReaderSource;

#[async_trait]
pub trait LineSource: Send {
    /// Next line including its terminator, or `None` once the stream is
    /// exhausted.
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;

    /// Release the underlying resource. Further reads return `None`.
    async fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S> LineSource for Box<S>
where
    S: LineSource + ?Sized,
{
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        (**self).next_line().await
    }

    async fn close(&mut self) -> std::io::Result<()> {
        (**self).close().await
    }
}
