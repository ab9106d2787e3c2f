use std::path::Path;

use tokio::fs::File;
use tokio::io::{BufReader, Stdin};

use crate::error::Result;
use crate::source::{LineSource, ReaderSource};

/// Line source over a plain file.
pub type FileSource = ReaderSource<BufReader<File>>;

/// Line source over standard input.
pub type StdinSource = ReaderSource<BufReader<Stdin>>;

/// Open `path` as a line source.
///
/// `-` reads standard input. With the `gzip` feature, paths ending in `.gz`
/// are decompressed on the fly.
pub async fn open(path: impl AsRef<Path>) -> Result<Box<dyn LineSource>> {
    let path = path.as_ref();

    if path == Path::new("-") {
        return Ok(Box::new(open_stdin()));
    }

    let file = File::open(path).await?;

    #[cfg(feature = "gzip")]
    if path.extension().is_some_and(|ext| ext == "gz") {
        let file = file.into_std().await;
        return Ok(Box::new(crate::source::BlockingSource::gzip(file)));
    }

    Ok(Box::new(open_file_handle(file)))
}

/// Read standard input. Nothing is read until the first `next_line`.
pub fn open_stdin() -> StdinSource {
    ReaderSource::new(BufReader::new(tokio::io::stdin()))
}

/// Wrap an already opened file.
pub fn open_file_handle(file: File) -> FileSource {
    ReaderSource::new(BufReader::new(file))
}
