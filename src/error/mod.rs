use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by caller-supplied transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    /// The pipeline stopped because `cancel()` was requested.
    #[error("reading canceled")]
    Cancelled,

    #[error("line source error: {0}")]
    Source(#[from] std::io::Error),

    /// `line` is the 1-based position of the failing line in the stream.
    #[error("transform failed on line {line}: {source}")]
    Transform {
        line: u64,
        #[source]
        source: BoxError,
    },

    #[error("pipeline error: {context}")]
    Pipeline { context: &'static str },

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn pipeline(context: &'static str) -> Self {
        Self::Pipeline { context }
    }

    pub fn transform(line: u64, source: impl Into<BoxError>) -> Self {
        Self::Transform {
            line,
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
