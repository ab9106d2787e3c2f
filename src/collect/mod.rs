//! Fan-in side of the pipeline.

pub mod reorder;

pub use reorder::Reorderer;
