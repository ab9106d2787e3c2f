//! Count NDJSON records by their `"type"` field.
//!
//! Run with:
//! ```bash
//! RUST_LOG=linepipe=debug cargo run --example count_records --features ndjson -- events.ndjson
//! ```
//!
//! Pass `-` to read standard input.

use std::collections::BTreeMap;

use linepipe::error::Result;
use linepipe::ndjson::NdjsonTransform;
use linepipe::prelude::*;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "-".to_owned());
    let config = ReaderConfig::new().chunk_size(10_000);

    let mut reader = BufferedReader::open(&path, config, NdjsonTransform::<Record>::new()).await?;

    let mut counts = BTreeMap::<String, u64>::new();
    let mut chunks = 0_u64;
    while let Some(chunk) = reader.recv().await {
        chunks += 1;
        for record in chunk.into_result()? {
            let kind = record.kind.unwrap_or_else(|| "<none>".to_owned());
            *counts.entry(kind).or_default() += 1;
        }
    }

    for (kind, n) in &counts {
        println!("{kind:>16} {n}");
    }
    println!("{} records in {chunks} chunks", counts.values().sum::<u64>());

    reader.join().await
}
