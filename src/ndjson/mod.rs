//! NDJSON line transform (feature `ndjson`).

mod decoder;

pub use decoder::NdjsonTransform;
