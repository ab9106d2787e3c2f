//! Per-line transforms and the worker pool that applies them.

use crate::error::BoxError;

pub mod pool;

pub use pool::TransformPool;

/// What a transform decided for one line.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Keep the produced value.
    Keep(T),
    /// Filter the line out.
    Skip,
    /// Abort the rest of the chunk and end the pipeline.
    Fail(BoxError),
}

impl<T> Outcome<T> {
    pub fn fail(err: impl Into<BoxError>) -> Self {
        Self::Fail(err.into())
    }
}

impl<T, E> From<Result<Option<T>, E>> for Outcome<T>
where
    E: Into<BoxError>,
{
    fn from(res: Result<Option<T>, E>) -> Self {
        match res {
            Ok(Some(value)) => Self::Keep(value),
            Ok(None) => Self::Skip,
            Err(err) => Self::Fail(err.into()),
        }
    }
}

/// A per-line transform.
///
/// Implemented for every `Fn(&str) -> Outcome<T>`. Lines are passed with their
/// terminator still attached.
pub trait Transform<T>: Send + Sync + 'static {
    fn apply(&self, line: &str) -> Outcome<T>;
}

impl<T, F> Transform<T> for F
where
    F: Fn(&str) -> Outcome<T> + Send + Sync + 'static,
{
    fn apply(&self, line: &str) -> Outcome<T> {
        self(line)
    }
}

/// Keeps every line with its trailing `\n` / `\r\n` removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimNewline;

impl Transform<String> for TrimNewline {
    fn apply(&self, line: &str) -> Outcome<String> {
        Outcome::Keep(trim_newline(line).to_owned())
    }
}

pub fn trim_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
