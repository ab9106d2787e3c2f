use std::collections::VecDeque;

use async_trait::async_trait;

use crate::source::LineSource;

/// Lines held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lines: VecDeque<String>,
}

impl MemorySource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `text` after every `\n`, keeping the terminators.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_inclusive('\n'))
    }
}

#[async_trait]
impl LineSource for MemorySource {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    async fn close(&mut self) -> std::io::Result<()> {
        self.lines.clear();
        Ok(())
    }
}
