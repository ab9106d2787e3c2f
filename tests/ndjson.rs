#![cfg(feature = "ndjson")]

use linepipe::error::{Error, Result};
use linepipe::ndjson::NdjsonTransform;
use linepipe::prelude::*;
use linepipe::source::MemorySource;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Row {
    id: u32,
}

fn reader<T>(text: &str, transform: NdjsonTransform<T>) -> BufferedReader<T>
where
    T: serde::de::DeserializeOwned + Send + 'static,
{
    let config = ReaderConfig::new().buffer_size(2).chunk_size(2);
    BufferedReader::new(MemorySource::from_text(text), config, transform)
}

#[tokio::test]
async fn decodes_rows_in_order() -> Result<()> {
    let text: String = (1..=9).map(|id| format!("{{\"id\":{id}}}\n")).collect();
    let rows = reader(&text, NdjsonTransform::<Row>::new()).collect().await?;

    assert_eq!(rows, (1..=9).map(|id| Row { id }).collect::<Vec<_>>());
    Ok(())
}

#[tokio::test]
async fn blank_lines_are_skipped() -> Result<()> {
    let text = "{\"id\":1}\n\n   \r\n{\"id\":2}\r\n";
    let rows = reader(text, NdjsonTransform::<Row>::new()).collect().await?;

    assert_eq!(rows, vec![Row { id: 1 }, Row { id: 2 }]);
    Ok(())
}

#[tokio::test]
async fn blank_lines_fail_when_not_allowed() {
    let text = "{\"id\":1}\n\n{\"id\":2}\n";
    let transform = NdjsonTransform::<Row>::new().allow_empty_lines(false);

    let err = reader(text, transform).collect().await.expect_err("blank line should fail");
    assert!(matches!(err, Error::Transform { line: 2, .. }), "got {err:?}");
}

#[tokio::test]
async fn malformed_line_reports_preview() {
    let text = "{\"id\":1}\n{\"id\":2}\n{not json}\n{\"id\":4}\n";
    let mut reader = reader(text, NdjsonTransform::<Row>::new());

    let first = reader.recv().await.expect("first chunk");
    assert_eq!(first.into_result().ok(), Some(vec![Row { id: 1 }, Row { id: 2 }]));

    let second = reader.recv().await.expect("failing chunk");
    assert!(second.data.is_empty());
    match second.err {
        Some(Error::Transform { line, source }) => {
            assert_eq!(line, 3);
            let msg = source.to_string();
            assert!(msg.contains("failed to parse line"), "message: {msg}");
            assert!(msg.contains("preview: \"{not json}\""), "message: {msg}");
        }
        other => panic!("expected transform error, got {other:?}"),
    }
    assert!(reader.recv().await.is_none());
}

#[tokio::test]
async fn oversized_lines_fail() {
    let text = format!("{{\"id\":\"{}\"}}\n", "x".repeat(64));
    let transform = NdjsonTransform::<Value>::new().max_line_bytes(16);

    let err = reader(&text, transform).collect().await.expect_err("line is too long");
    assert!(err.to_string().contains("max_line_bytes"), "error: {err}");
}

#[tokio::test]
async fn untyped_values() -> Result<()> {
    let text = "{\"a\":1}\n[1,2]\n\"s\"\n";
    let values = reader(text, NdjsonTransform::<Value>::new()).collect().await?;

    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["a"], 1);
    assert!(values[1].is_array());
    Ok(())
}
