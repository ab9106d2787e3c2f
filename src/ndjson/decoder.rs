use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::transform::{trim_newline, Outcome, Transform};

const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Parses every line as one JSON value.
///
/// Blank lines are skipped unless [`allow_empty_lines(false)`] is set, in
/// which case they fail like any other malformed line.
///
/// [`allow_empty_lines(false)`]: NdjsonTransform::allow_empty_lines
pub struct NdjsonTransform<T> {
    max_line_bytes: usize,
    allow_empty_lines: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> NdjsonTransform<T> {
    pub fn new() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            allow_empty_lines: true,
            _marker: PhantomData,
        }
    }

    /// Maximum number of bytes allowed for a single line, terminator excluded.
    pub fn max_line_bytes(mut self, n: usize) -> Self {
        self.max_line_bytes = n;
        self
    }

    /// Whether blank lines should be skipped.
    pub fn allow_empty_lines(mut self, yes: bool) -> Self {
        self.allow_empty_lines = yes;
        self
    }
}

impl<T> Default for NdjsonTransform<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Transform<T> for NdjsonTransform<T>
where
    T: DeserializeOwned + 'static,
{
    fn apply(&self, line: &str) -> Outcome<T> {
        let line = trim_newline(line);

        if line.trim().is_empty() && self.allow_empty_lines {
            return Outcome::Skip;
        }

        if line.len() > self.max_line_bytes {
            return Outcome::fail(format!(
                "line exceeded max_line_bytes ({} > {})",
                line.len(),
                self.max_line_bytes
            ));
        }

        match serde_json::from_str::<T>(line) {
            Ok(value) => Outcome::Keep(value),
            Err(err) => Outcome::fail(format!(
                "failed to parse line ({} bytes, preview: {:?}): {}",
                line.len(),
                preview(line),
                err
            )),
        }
    }
}

fn preview(line: &str) -> String {
    const PREVIEW_LEN: usize = 80;
    let escaped = line.replace('\n', "\\n").replace('\r', "\\r");
    let mut short = escaped.chars().take(PREVIEW_LEN).collect::<String>();
    if escaped.chars().count() > PREVIEW_LEN {
        short.push_str("...");
    }
    short
}
