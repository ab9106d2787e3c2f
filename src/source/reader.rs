use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::source::LineSource;

/// Reads lines from any Tokio buffered reader.
///
/// A trailing fragment without a newline is returned as the last line.
pub struct ReaderSource<R> {
    inner: Option<R>,
}

impl<R> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Some(inner) }
    }
}

#[async_trait]
impl<R> LineSource for ReaderSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };

        let mut line = String::new();
        match inner.read_line(&mut line).await? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.inner = None;
        Ok(())
    }
}
